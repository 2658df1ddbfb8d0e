//! wish: a small line-oriented shell.
//!
//! Lines come from an interactive prompt or a script file. Each line is split
//! on whitespace into tokens, and the first token names either a built-in
//! (`exit`, `cd`, `path`) or an external program found on the shell's own
//! search path. A trailing `> file` sends the program's stdout and stderr to
//! `file`, and `&` runs several commands at once before waiting for all of them.
//!
//! The main entry point is [`Interpreter`]. Every failure is reported as the
//! same fixed message, [`error::ERROR_MESSAGE`]; the typed [`error::ShellError`]
//! only reaches the log.

mod builtin;
pub mod command;
/// Configuration types and loading: embedded defaults plus a user overlay.
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod lexer;
/// File-based diagnostics through `log` and `simplelog`.
pub mod logging;
pub mod parser;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
