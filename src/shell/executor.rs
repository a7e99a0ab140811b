use std::path::Path;

use crate::core::commands::{Command, CommandType};
use crate::error::{Result, ShellError};
use crate::process::Outcome;

pub(crate) trait CommandHandler {
    fn dispatch(&mut self, command: &[String]) -> Result<Outcome>;
}

impl CommandHandler for super::ShellSession {
    fn dispatch(&mut self, command: &[String]) -> Result<Outcome> {
        let Some(name) = command.first() else {
            return Err(ShellError::InvalidArgument("empty command".to_string()));
        };

        if let Some(builtin) = CommandType::lookup(name) {
            return builtin.execute(&command[1..], self);
        }

        self.executor
            .spawn_process(command, &self.environment, Path::new(&self.cwd))
    }
}
