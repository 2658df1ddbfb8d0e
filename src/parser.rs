use crate::error::ShellError;
use crate::lexer::ArgumentVector;
use std::path::PathBuf;

/// Output redirection marker.
pub const REDIRECT_MARKER: &str = ">";

/// One schedulable unit of work: a command line plus where its output goes.
///
/// Created per segment, consumed by exactly one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGroup {
    /// The command name followed by its arguments, redirection removed.
    pub argv: ArgumentVector,
    /// File receiving both stdout and stderr of the process, if any.
    pub redirect: Option<PathBuf>,
}

impl CommandGroup {
    /// Name of the command to run, `None` for an empty group.
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Split the redirection off an argument vector.
///
/// The scan stops at the first `>`. It must be followed by exactly one token,
/// the target file, otherwise the whole command is rejected with
/// [`ShellError::MalformedRedirection`] and nothing is truncated.
pub fn resolve_redirection(mut argv: ArgumentVector) -> Result<CommandGroup, ShellError> {
    let Some(marker) = argv.iter().position(|token| token == REDIRECT_MARKER) else {
        return Ok(CommandGroup {
            argv,
            redirect: None,
        });
    };

    if argv.len() != marker + 2 {
        return Err(ShellError::MalformedRedirection);
    }

    let target = argv.pop().map(PathBuf::from);
    argv.truncate(marker);
    Ok(CommandGroup {
        argv,
        redirect: target,
    })
}
