//! Command table and dispatch.

use crate::error::{CmdLineError, CmdResult};
use crate::parser::{tokenize, DEFAULT_MAX_ARGS};

/// Optional text sent back to whoever issued the command.
pub type Reply = Option<String>;

/// Signature of a command handler.
pub type CommandFn<C> = fn(&mut Invocation<'_, C>) -> CmdResult<Reply>;

/// Everything a handler gets to see when it runs.
pub struct Invocation<'a, C> {
    /// The state commands act on.
    pub target: &'a mut C,
    /// Arguments, command name first.
    pub args: &'a [&'a str],
    /// The table the command was found in.
    pub commands: &'a [CommandEntry<C>],
}

/// A named command.
pub struct CommandEntry<C> {
    /// Name matched against the first token.
    pub name: &'static str,
    /// Function run when the name matches.
    pub handler: CommandFn<C>,
    /// One-line description shown by `help`.
    pub help: &'static str,
}

impl<C> Clone for CommandEntry<C> {
    fn clone(&self) -> Self {
        CommandEntry {
            name: self.name,
            handler: self.handler,
            help: self.help,
        }
    }
}

impl<C> std::fmt::Debug for CommandEntry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish()
    }
}

/// Command lookup table. The first entry with a matching name wins.
#[derive(Debug, Clone)]
pub struct CommandTable<C> {
    entries: Vec<CommandEntry<C>>,
    max_args: usize,
}

impl<C> Default for CommandTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CommandTable<C> {
    /// Create an empty table accepting [`DEFAULT_MAX_ARGS`] arguments.
    pub fn new() -> Self {
        CommandTable {
            entries: Vec::new(),
            max_args: DEFAULT_MAX_ARGS,
        }
    }

    /// Set the maximum number of arguments, command included.
    pub fn with_max_args(mut self, max_args: usize) -> Self {
        self.max_args = max_args.max(1);
        self
    }

    /// Add a command.
    pub fn with_command(mut self, name: &'static str, handler: CommandFn<C>, help: &'static str) -> Self {
        self.register(name, handler, help);
        self
    }

    /// Add a command to an existing table.
    pub fn register(&mut self, name: &'static str, handler: CommandFn<C>, help: &'static str) {
        self.entries.push(CommandEntry { name, handler, help });
    }

    /// Most tokens a line may carry, command name included.
    pub fn max_args(&self) -> usize {
        self.max_args
    }

    /// Registered commands in lookup order.
    pub fn entries(&self) -> &[CommandEntry<C>] {
        &self.entries
    }

    /// First command called `name`.
    pub fn find(&self, name: &str) -> Option<&CommandEntry<C>> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Split `line` into arguments and run the matching command.
    pub fn process(&self, target: &mut C, line: &[u8]) -> CmdResult<Reply> {
        let args = tokenize(line, self.max_args)?;
        let Some(&name) = args.first() else {
            return Err(CmdLineError::BadCommand(String::new()));
        };
        let entry = self
            .find(name)
            .ok_or_else(|| CmdLineError::BadCommand(name.to_string()))?;

        log::debug!("Running command {:?} with {} argument(s)", entry.name, args.len());
        let mut invocation = Invocation {
            target,
            args: &args,
            commands: &self.entries,
        };
        (entry.handler)(&mut invocation)
    }
}

/// One `name : help` line per command.
pub fn help_text<C>(commands: &[CommandEntry<C>]) -> String {
    commands
        .iter()
        .map(|entry| format!("{} : {}\n", entry.name, entry.help))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        hits: u32,
        last_args: Vec<String>,
    }

    fn count(inv: &mut Invocation<'_, Counter>) -> CmdResult<Reply> {
        inv.target.hits += 1;
        inv.target.last_args = inv.args.iter().map(|s| s.to_string()).collect();
        Ok(None)
    }

    fn echo(inv: &mut Invocation<'_, Counter>) -> CmdResult<Reply> {
        Ok(Some(inv.args[1..].join(" ")))
    }

    fn table() -> CommandTable<Counter> {
        CommandTable::new()
            .with_max_args(3)
            .with_command("count", count, "Count calls")
            .with_command("echo", echo, "Echo arguments")
    }

    #[test]
    fn test_dispatch() {
        let mut counter = Counter::default();
        let table = table();

        assert_eq!(table.process(&mut counter, b"count a b"), Ok(None));
        assert_eq!(counter.hits, 1);
        assert_eq!(counter.last_args, vec!["count", "a", "b"]);

        assert_eq!(
            table.process(&mut counter, b"echo hi there"),
            Ok(Some("hi there".to_string()))
        );
    }

    #[test]
    fn test_bad_command() {
        let mut counter = Counter::default();
        let table = table();

        let err = table.process(&mut counter, b"launch").unwrap_err();
        assert_eq!(err, CmdLineError::BadCommand("launch".into()));
        assert_eq!(err.code(), -1);

        let err = table.process(&mut counter, b"").unwrap_err();
        assert_eq!(err.code(), -1);
        assert_eq!(counter.hits, 0);
    }

    #[test]
    fn test_too_many_args_not_dispatched() {
        let mut counter = Counter::default();
        let err = table().process(&mut counter, b"count a b c").unwrap_err();
        assert_eq!(err, CmdLineError::TooManyArgs { max: 3 });
        assert_eq!(err.code(), -2);
        assert_eq!(counter.hits, 0);
    }

    #[test]
    fn test_first_match_wins() {
        fn other(_: &mut Invocation<'_, Counter>) -> CmdResult<Reply> {
            Ok(Some("second".into()))
        }
        let table = table().with_command("count", other, "Shadowed");
        let mut counter = Counter::default();
        assert_eq!(table.process(&mut counter, b"count"), Ok(None));
        assert_eq!(counter.hits, 1);
    }

    #[test]
    fn test_help_text() {
        let table = table();
        assert_eq!(
            help_text(table.entries()),
            "count : Count calls\necho : Echo arguments\n"
        );
    }

    #[test]
    fn test_max_args_at_least_one() {
        let table: CommandTable<Counter> = CommandTable::new().with_max_args(0);
        assert_eq!(table.max_args(), 1);
    }
}
