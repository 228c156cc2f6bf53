use crate::commands::RegistryError;

/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// host can handle failures consistently (user-facing message vs log and drop).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("external error: {0}")]
    External(String),

    #[error("operation is restricted to bot owners")]
    NotOwner,

    #[error("module {0} cannot be disabled")]
    ModuleCannotBeDisabled(String),

    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("command registry error: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, Error>;
