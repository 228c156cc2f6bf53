//! Sub-command registry, routing and help rendering for modules that expose
//! several commands under one module name (e.g. `!mtga register <name>`).
//!
//! Commands are registered explicitly when the module is constructed. The
//! registry keeps registration order so the help screen is stable.

use std::fmt;

/// Name of the built-in alias that renders the help screen.
pub const HELP_ALIAS: &str = "help";

/// Documentation of the built-in help screen.
pub const HELP_DOC: &str = "Print this help screen";

/// Problems with a registry that are detected when the module is loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("command {command} has no documentation")]
    MissingDocumentation { command: String },

    #[error("alias {alias} points to unknown command {target}")]
    UnknownAliasTarget { alias: String, target: String },

    #[error("command {command} is registered twice")]
    DuplicateCommand { command: String },
}

/// Help was requested for a name that is neither a command nor an alias.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown command: {name}")]
pub struct UnknownCommand {
    pub name: String,
}

/// What a registered name does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'r, H> {
    Help,
    Run(&'r H),
}

/// Result of routing an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation<'r, 'a, H> {
    /// Run a registered command.
    Run {
        /// Canonical command name (aliases already resolved).
        command: &'r str,
        handler: &'r H,
        /// Arguments after the command token.
        rest: &'a [String],
        /// The full argument list, command token included.
        args: &'a [String],
    },
    /// Render the help screen for `args`.
    Help { args: &'a [String] },
}

#[derive(Debug, Clone)]
struct Entry<H> {
    name: String,
    doc: String,
    handler: H,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AliasTarget {
    Help,
    Command(usize),
}

/// Ordered set of sub-commands with their documentation and aliases.
#[derive(Debug, Clone)]
pub struct CommandRegistry<H> {
    commands: Vec<Entry<H>>,
    aliases: Vec<(String, AliasTarget)>,
}

/// Declarative registration of commands and aliases.
#[derive(Debug, Clone)]
pub struct CommandRegistryBuilder<H> {
    commands: Vec<(String, H, String)>,
    aliases: Vec<(String, String)>,
}

impl<H> Default for CommandRegistryBuilder<H> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            aliases: Vec::new(),
        }
    }
}

impl<H> CommandRegistryBuilder<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. The first line of `doc` is its one-line summary.
    pub fn command(mut self, name: impl Into<String>, handler: H, doc: &str) -> Self {
        self.commands.push((name.into(), handler, doc.to_string()));
        self
    }

    /// Register `alias` as an alternate name for the command `target`.
    pub fn alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.push((alias.into(), target.into()));
        self
    }

    pub fn build(self) -> Result<CommandRegistry<H>, RegistryError> {
        let mut commands: Vec<Entry<H>> = Vec::with_capacity(self.commands.len());
        for (name, handler, doc) in self.commands {
            if commands.iter().any(|c| c.name == name) {
                return Err(RegistryError::DuplicateCommand { command: name });
            }
            let doc = clean_doc(&doc);
            if doc.is_empty() {
                return Err(RegistryError::MissingDocumentation { command: name });
            }
            commands.push(Entry { name, doc, handler });
        }

        let mut aliases: Vec<(String, AliasTarget)> = Vec::new();
        let builtin = std::iter::once((HELP_ALIAS.to_string(), None));
        let declared = self.aliases.into_iter().map(|(a, t)| (a, Some(t)));
        for (alias, target) in builtin.chain(declared) {
            if commands.iter().any(|c| c.name == alias) {
                tracing::debug!(alias = %alias, "alias shadowed by a command of the same name");
                continue;
            }
            if aliases.iter().any(|(a, _)| *a == alias) {
                tracing::debug!(alias = %alias, "alias declared twice, keeping the first");
                continue;
            }
            let resolved = match target {
                None => AliasTarget::Help,
                Some(target) => match commands.iter().position(|c| c.name == target) {
                    Some(idx) => AliasTarget::Command(idx),
                    None => return Err(RegistryError::UnknownAliasTarget { alias, target }),
                },
            };
            aliases.push((alias, resolved));
        }

        Ok(CommandRegistry { commands, aliases })
    }
}

impl<H> CommandRegistry<H> {
    pub fn builder() -> CommandRegistryBuilder<H> {
        CommandRegistryBuilder::new()
    }

    /// Every invocable name: commands first, then aliases, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.aliases.iter().map(|(a, _)| a.as_str()))
    }

    /// Resolve a name to what it does. A command always wins over an alias.
    pub fn resolve(&self, name: &str) -> Option<Action<'_, H>> {
        self.lookup(name).map(|target| match target {
            AliasTarget::Help => Action::Help,
            AliasTarget::Command(idx) => Action::Run(&self.commands[idx].handler),
        })
    }

    /// Cleaned documentation of a command or alias.
    pub fn doc(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|target| self.target_doc(target))
    }

    /// Pick the handler for `args` or fall back to the help screen.
    pub fn route<'a>(&self, args: &'a [String]) -> Invocation<'_, 'a, H> {
        let Some(first) = args.first() else {
            return Invocation::Help { args };
        };
        match self.lookup(first) {
            Some(AliasTarget::Command(idx)) => {
                let entry = &self.commands[idx];
                Invocation::Run {
                    command: &entry.name,
                    handler: &entry.handler,
                    rest: &args[1..],
                    args,
                }
            }
            Some(AliasTarget::Help) | None => Invocation::Help { args },
        }
    }

    /// Render the help screen.
    ///
    /// With no arguments (or just `help`) this is the summary of all commands,
    /// otherwise the full documentation of the named command.
    pub fn render_help(&self, args: &[String]) -> Result<String, UnknownCommand> {
        let args = match args.first() {
            Some(first) if first == HELP_ALIAS => &args[1..],
            _ => args,
        };

        let Some(name) = args.first() else {
            return Ok(self.summary());
        };

        self.doc(name).map(str::to_string).ok_or_else(|| UnknownCommand {
            name: name.clone(),
        })
    }

    /// Like [`render_help`](Self::render_help) but with the error rendered as text.
    pub fn help_text(&self, args: &[String]) -> String {
        self.render_help(args).unwrap_or_else(|e| e.to_string())
    }

    fn summary(&self) -> String {
        let width = self.names().map(|n| n.chars().count()).max().unwrap_or(0);
        let mut lines = vec!["Subcommands :".to_string(), "---------------".to_string()];
        for name in self.names() {
            let short = self.doc(name).and_then(|d| d.lines().next()).unwrap_or("");
            lines.push(format!("{name:<width$} - {short}"));
        }
        lines.join("\n")
    }

    fn lookup(&self, name: &str) -> Option<AliasTarget> {
        if let Some(idx) = self.commands.iter().position(|c| c.name == name) {
            return Some(AliasTarget::Command(idx));
        }
        self.aliases
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, target)| *target)
    }

    fn target_doc(&self, target: AliasTarget) -> &str {
        match target {
            AliasTarget::Help => HELP_DOC,
            AliasTarget::Command(idx) => &self.commands[idx].doc,
        }
    }
}

impl<H> fmt::Display for CommandRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Normalize a documentation block: tabs are expanded to 8 columns, the first
/// line is trimmed, the common indentation of the remaining lines is removed,
/// and leading and trailing blank lines are dropped.
pub fn clean_doc(doc: &str) -> String {
    let expanded: Vec<String> = doc.lines().map(expand_tabs).collect();
    let mut lines: Vec<&str> = expanded.iter().map(String::as_str).collect();
    if lines.is_empty() {
        return String::new();
    }

    let indent = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    out.push(lines.remove(0).trim().to_string());
    for line in lines {
        let stripped = if line.len() >= indent && line.is_char_boundary(indent) {
            &line[indent..]
        } else {
            line.trim_start()
        };
        out.push(stripped.trim_end().to_string());
    }

    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

fn expand_tabs(line: &str) -> String {
    const TAB_WIDTH: usize = 8;
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        Add,
        List,
        Remove,
    }

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn registry() -> CommandRegistry<Cmd> {
        CommandRegistry::builder()
            .command(
                "add",
                Cmd::Add,
                "Add an item

                Usage: add <name>
                  <name> may not contain spaces
                ",
            )
            .command("list", Cmd::List, "List all items")
            .command("remove", Cmd::Remove, "Remove an item")
            .alias("rm", "remove")
            .alias("ls", "list")
            .build()
            .unwrap()
    }

    #[test]
    fn empty_args_route_to_help() {
        let reg = registry();
        let a: Vec<String> = vec![];
        assert_eq!(reg.route(&a), Invocation::Help { args: &a[..] });
    }

    #[test]
    fn unknown_first_arg_routes_to_help_with_all_args() {
        let reg = registry();
        let a = args("frobnicate now");
        assert_eq!(reg.route(&a), Invocation::Help { args: &a[..] });
    }

    #[test]
    fn command_routes_with_rest_and_full_args() {
        let reg = registry();
        let a = args("add apple pie");
        match reg.route(&a) {
            Invocation::Run {
                command,
                handler,
                rest,
                args: full,
            } => {
                assert_eq!(command, "add");
                assert_eq!(*handler, Cmd::Add);
                assert_eq!(rest, &a[1..]);
                assert_eq!(full, &a[..]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn alias_resolves_to_canonical_command() {
        let reg = registry();
        let a = args("rm apple");
        match reg.route(&a) {
            Invocation::Run {
                command, handler, ..
            } => {
                assert_eq!(command, "remove");
                assert_eq!(*handler, Cmd::Remove);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn matching_is_case_sensitive_and_exact() {
        let reg = registry();
        for input in ["Add x", "ad x", "adds x", "LS"] {
            let a = args(input);
            assert!(matches!(reg.route(&a), Invocation::Help { .. }), "{input}");
        }
    }

    #[test]
    fn command_shadows_alias_of_the_same_name() {
        let reg = CommandRegistry::builder()
            .command("list", Cmd::List, "List all items")
            .command("remove", Cmd::Remove, "Remove an item")
            .alias("list", "remove")
            .build()
            .unwrap();

        let a = args("list");
        assert!(matches!(
            reg.route(&a),
            Invocation::Run {
                handler: Cmd::List,
                ..
            }
        ));
        assert_eq!(reg.names().filter(|n| *n == "list").count(), 1);
    }

    #[test]
    fn command_named_help_replaces_builtin() {
        let reg = CommandRegistry::builder()
            .command("help", Cmd::List, "Custom help")
            .build()
            .unwrap();
        assert_eq!(reg.resolve("help"), Some(Action::Run(&Cmd::List)));
    }

    #[test]
    fn help_alias_routes_to_help() {
        let reg = registry();
        let a = args("help add");
        assert_eq!(reg.route(&a), Invocation::Help { args: &a[..] });
        assert_eq!(reg.resolve("help"), Some(Action::Help));
    }

    #[test]
    fn summary_is_ordered_and_padded() {
        let reg = registry();
        let text = reg.render_help(&[]).unwrap();
        let expected = "\
Subcommands :
---------------
add    - Add an item
list   - List all items
remove - Remove an item
help   - Print this help screen
rm     - Remove an item
ls     - List all items";
        assert_eq!(text, expected);
        assert_eq!(reg.render_help(&args("help")).unwrap(), expected);
        assert_eq!(reg.to_string(), expected);
    }

    #[test]
    fn detail_strips_common_indentation() {
        let reg = registry();
        let text = reg.render_help(&args("help add")).unwrap();
        assert_eq!(
            text,
            "Add an item\n\nUsage: add <name>\n  <name> may not contain spaces"
        );
    }

    #[test]
    fn detail_for_alias_shows_target_doc() {
        let reg = registry();
        assert_eq!(reg.render_help(&args("help rm")).unwrap(), "Remove an item");
        assert_eq!(
            reg.render_help(&args("help help")).unwrap(),
            "Print this help screen"
        );
    }

    #[test]
    fn detail_for_unknown_name_fails() {
        let reg = registry();
        let err = reg.render_help(&args("help nope")).unwrap_err();
        assert_eq!(
            err,
            UnknownCommand {
                name: "nope".to_string()
            }
        );
        assert_eq!(reg.help_text(&args("nope")), "Unknown command: nope");
    }

    #[test]
    fn missing_documentation_fails_at_build() {
        let err = CommandRegistry::builder()
            .command("add", Cmd::Add, "   \n  ")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingDocumentation {
                command: "add".to_string()
            }
        );
    }

    #[test]
    fn alias_to_unknown_command_fails_at_build() {
        let err = CommandRegistry::builder()
            .command("add", Cmd::Add, "Add")
            .alias("del", "remove")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAliasTarget { .. }));
    }

    #[test]
    fn alias_chains_are_rejected() {
        let err = CommandRegistry::builder()
            .command("remove", Cmd::Remove, "Remove")
            .alias("rm", "remove")
            .alias("r", "rm")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownAliasTarget {
                alias: "r".to_string(),
                target: "rm".to_string()
            }
        );
    }

    #[test]
    fn duplicate_command_fails_at_build() {
        let err = CommandRegistry::builder()
            .command("add", Cmd::Add, "Add")
            .command("add", Cmd::List, "Again")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateCommand { .. }));
    }

    #[test]
    fn clean_doc_expands_tabs_before_measuring_indent() {
        assert_eq!(clean_doc("Head\n\tx\n        y"), "Head\nx\ny");
        assert_eq!(clean_doc("Head\n\tx\n\t  y"), "Head\nx\n  y");
        assert_eq!(clean_doc("Head\n  \tx\n        y"), "Head\nx\ny");
    }

    #[test]
    fn clean_doc_handles_single_line() {
        assert_eq!(clean_doc("  Just one line  "), "Just one line");
        assert_eq!(clean_doc(""), "");
        assert_eq!(clean_doc("\n   First\n   second"), "First\nsecond");
    }
}
