use std::path::{Path, PathBuf};

/// Ordered list of directories consulted when resolving a bare command name.
///
/// Order is significant: the first directory holding a matching executable
/// wins. Duplicates are kept as given. The list is only ever replaced as a
/// whole, by the `path` built-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath(Vec<PathBuf>);

impl SearchPath {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self(dirs.into_iter().map(Into::into).collect())
    }

    /// Replace every entry with `dirs`, which may be empty.
    pub fn replace<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        *self = Self::new(dirs);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Mutable interpreter state shared by the built-ins and the path resolver.
///
/// The environment contains:
/// - `search_path`: directories searched for external commands.
/// - `should_exit`: set by the `exit` built-in; the read loop stops once it is true.
///
/// The working directory is not mirrored here: `cd` changes the process'
/// own directory, which every spawned child inherits.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Directories searched for external commands.
    pub search_path: SearchPath,
    /// When set to true, the interpreter stops reading input.
    pub should_exit: bool,
}

impl Environment {
    /// Create a fresh environment starting from `search_path`.
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            search_path,
            should_exit: false,
        }
    }
}

/// Serializes tests that read or change the process working directory.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
