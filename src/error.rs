use std::io;
use std::path::PathBuf;

/// The only diagnostic the user ever sees, whatever went wrong.
pub const ERROR_MESSAGE: &str = "An error has occurred\n";

/// Broad classes of failure.
///
/// They decide nothing about what is printed (always [`ERROR_MESSAGE`]) but are
/// recorded in the log and let callers tell failures apart programmatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A built-in was called with the wrong number of arguments.
    Usage,
    /// The command was well-formed but could not be carried out.
    Runtime,
    /// A `>` was not followed by exactly one file name.
    MalformedRedirection,
}

/// Failures detected while processing one line.
///
/// None of these stop the interpreter; the coordinator reports them and moves
/// on to the next line.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("cd: {}: {source}", path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("redirection must be followed by exactly one file name")]
    MalformedRedirection,

    #[error("cannot open {} for writing: {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),
}

impl ShellError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::Usage(_) => ErrorKind::Usage,
            ShellError::MalformedRedirection => ErrorKind::MalformedRedirection,
            ShellError::ChangeDir { .. }
            | ShellError::CommandNotFound(_)
            | ShellError::Redirect { .. }
            | ShellError::Spawn { .. }
            | ShellError::Wait(_) => ErrorKind::Runtime,
        }
    }
}
