use std::fmt;

/// Chat room identifier (opaque, network specific).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub String);

/// Chat user identifier (opaque, network specific).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room the bot is a member of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
}

/// A plain text message that arrived in a room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEvent {
    pub sender: UserId,
    pub body: String,
}

impl TextEvent {
    /// Whitespace-split tokens of the body with the leading command token removed.
    pub fn args(&self) -> Vec<String> {
        self.body
            .split_whitespace()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    /// Body with the leading command token and its separator removed.
    pub fn rest(&self) -> &str {
        let trimmed = self.body.trim_start();
        match trimmed.find(char::is_whitespace) {
            Some(idx) => trimmed[idx..].trim_start(),
            None => "",
        }
    }

    /// The leading command token (e.g. `!roll`).
    pub fn command_token(&self) -> Option<&str> {
        self.body.split_whitespace().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(body: &str) -> TextEvent {
        TextEvent {
            sender: UserId("@a:x".to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn args_drop_command_token() {
        assert_eq!(event("!roll  2d6 +  d4").args(), vec!["2d6", "+", "d4"]);
        assert!(event("!roll").args().is_empty());
    }

    #[test]
    fn rest_keeps_inner_spacing() {
        assert_eq!(event("!wa  what is  2+2").rest(), "what is  2+2");
        assert_eq!(event("!wa").rest(), "");
    }
}
