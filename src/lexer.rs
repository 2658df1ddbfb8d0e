//! Lexical analysis for the shell's line grammar.
//!
//! The grammar is deliberately flat: tokens are separated by runs of spaces and
//! tabs, and a line may be cut into segments on the parallel separator. There is
//! no quoting, so whitespace inside quotes still separates tokens.

/// Characters that separate tokens.
const SEPARATORS: [char; 2] = [' ', '\t'];

/// Character that separates commands meant to run concurrently.
pub const PARALLEL_SEPARATOR: char = '&';

/// An ordered list of tokens for one command invocation.
///
/// Index 0 is the command name and the rest are its arguments.
pub type ArgumentVector = Vec<String>;

/// Split a line into tokens on runs of whitespace.
///
/// Empty fields are discarded, so leading, trailing and repeated separators
/// produce no tokens, and an empty or blank line yields an empty vector.
pub fn split_into_tokens(line: &str) -> ArgumentVector {
    line.split(SEPARATORS)
        .filter(|field| !field.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Whether the line asks for parallel execution.
pub fn is_parallel(line: &str) -> bool {
    line.contains(PARALLEL_SEPARATOR)
}

/// Cut a line into segments on the parallel separator, left to right.
///
/// Segments are returned untrimmed and may be empty; callers skip the ones
/// that tokenize to nothing.
pub fn split_into_segments(line: &str) -> impl Iterator<Item = &str> {
    line.split(PARALLEL_SEPARATOR)
}
