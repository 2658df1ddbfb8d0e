use crate::command::{ExecutableCommand, ExitCode};
use crate::env::{Environment, SearchPath};
use crate::error::ShellError;
use crate::parser::CommandGroup;
use std::ffi::{OsStr, OsString};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};

/// Permissions of a freshly created redirection target: owner rwx.
const REDIRECT_MODE: u32 = 0o700;

/// Command that is not a builtin, resolved and ready to spawn.
///
/// Holds the redirection target already opened, so spawning cannot fail on
/// account of the file and each child gets its own descriptors.
#[derive(Debug)]
pub struct ExternalCommand {
    program: PathBuf,
    argv: Vec<String>,
    output: Option<File>,
}

impl ExternalCommand {
    /// Open the group's redirection target and resolve its command name.
    ///
    /// The target is opened first, so it is created (or truncated) even when
    /// the command turns out not to exist.
    pub fn prepare(search_path: &SearchPath, group: CommandGroup) -> Result<Self, ShellError> {
        let output = group.redirect.as_deref().map(open_redirect).transpose()?;

        let name = group.name().unwrap_or_default();
        let program = find_command_path(search_path, OsStr::new(name))
            .ok_or_else(|| ShellError::CommandNotFound(name.to_owned()))?;

        Ok(Self {
            program,
            argv: group.argv,
            output,
        })
    }

    /// Start the process without waiting for it.
    ///
    /// The child sees the command name as typed in `argv[0]`. With a
    /// redirection, both stdout and stderr of the child point at the target;
    /// the shell's own streams are untouched.
    pub fn spawn(self) -> Result<Child, ShellError> {
        let mut cmd = std::process::Command::new(&self.program);
        if let Some((arg0, args)) = self.argv.split_first() {
            cmd.arg0(arg0).args(args);
        }

        if let Some(file) = self.output {
            let stderr = file.try_clone().map_err(|source| ShellError::Spawn {
                program: self.program.clone(),
                source,
            })?;
            cmd.stdout(Stdio::from(file)).stderr(Stdio::from(stderr));
        }

        log::debug!("spawning {} {:?}", self.program.display(), self.argv);
        cmd.spawn().map_err(|source| ShellError::Spawn {
            program: self.program,
            source,
        })
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, _env: &mut Environment) -> Result<ExitCode, ShellError> {
        let mut child = self.spawn()?;
        wait_for(&mut child)
    }
}

/// Block until `child` terminates and return its exit code.
pub fn wait_for(child: &mut Child) -> Result<ExitCode, ShellError> {
    let status = child.wait().map_err(ShellError::Wait)?;
    let code = match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    };
    log::debug!("child {} exited with {}", child.id(), code);
    Ok(code)
}

fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

/// Open a redirection target for writing: create if absent, truncate if present.
pub fn open_redirect(path: &Path) -> Result<File, ShellError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(REDIRECT_MODE)
        .open(path)
        .map_err(|source| ShellError::Redirect {
            path: path.to_owned(),
            source,
        })
}

/// Resolve a command name against the search path.
///
/// Each directory is tried in order as `<directory>/<name>`, and the first
/// candidate that is an executable file wins. The name is always joined to a
/// directory, even if it already contains a slash, so with an empty search
/// path nothing resolves.
pub fn find_command_path(search_paths: &SearchPath, cmd: &OsStr) -> Option<PathBuf> {
    if cmd.is_empty() {
        return None;
    }
    search_paths
        .iter()
        .map(|dir| candidate(dir, cmd))
        .find(|path| is_executable(path))
}

fn candidate(dir: &Path, cmd: &OsStr) -> PathBuf {
    let mut joined = OsString::from(dir.as_os_str());
    joined.push("/");
    joined.push(cmd);
    PathBuf::from(joined)
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
