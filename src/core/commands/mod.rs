mod cd;

pub use cd::{change_dir, CdCommand};

use crate::error::Result;
use crate::process::Outcome;
use crate::shell::ShellSession;

/// A command interpreted by the session itself instead of being spawned.
pub trait Command {
    fn execute(&self, args: &[String], session: &mut ShellSession) -> Result<Outcome>;
}

#[derive(Clone, Debug)]
pub enum CommandType {
    Cd(CdCommand),
}

impl CommandType {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(CommandType::Cd(CdCommand::new())),
            _ => None,
        }
    }
}

impl Command for CommandType {
    fn execute(&self, args: &[String], session: &mut ShellSession) -> Result<Outcome> {
        match self {
            CommandType::Cd(cmd) => cmd.execute(args, session),
        }
    }
}

pub fn is_builtin(name: &str) -> bool {
    CommandType::lookup(name).is_some()
}
