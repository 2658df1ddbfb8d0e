use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process. Their output is never redirected.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "exit" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the interpreter state.
    fn execute(self, env: &mut Environment) -> Result<ExitCode, ShellError>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<ExitCode, ShellError> {
        BuiltinCommand::execute(*self, env)
    }
}

/// Stand-in for a built-in whose arguments did not parse.
///
/// Executing it changes nothing and reports a usage error.
struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, _env: &mut Environment) -> Result<ExitCode, ShellError> {
        Err(ShellError::Usage(self.output))
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        // Built-ins take no flags: a leading `--` makes argh read every token,
        // including `--`, `--help` and `-x`, as a positional argument.
        let positional: Vec<&str> = std::iter::once("--").chain(args.iter().copied()).collect();
        Some(match T::from_args(&[name], &positional) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
        })
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, env: &mut Environment) -> Result<ExitCode, ShellError> {
        log::debug!("exit requested");
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _env: &mut Environment) -> Result<ExitCode, ShellError> {
        let target = PathBuf::from(self.target);
        env::set_current_dir(&target).map_err(|source| ShellError::ChangeDir {
            path: target.clone(),
            source,
        })?;
        log::debug!("cd: now in {}", target.display());
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Replace the list of directories searched for commands.
/// With no arguments the list becomes empty and only built-ins keep working.
pub struct Path {
    #[argh(positional, greedy)]
    /// directories to search, in order.
    pub dirs: Vec<String>,
}

impl BuiltinCommand for Path {
    fn name() -> &'static str {
        "path"
    }

    fn execute(self, env: &mut Environment) -> Result<ExitCode, ShellError> {
        log::debug!("path: {:?}", self.dirs);
        env.search_path.replace(self.dirs);
        Ok(0)
    }
}
