use crate::command::{CommandFactory, ExecutableCommand};
use crate::config::ShellSettings;
use crate::env::{Environment, SearchPath};
use crate::error::{ERROR_MESSAGE, ShellError};
use crate::external::{self, ExternalCommand};
use crate::lexer;
use crate::parser;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};
use std::process::Child;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the built-in commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The shell: reads lines, recognizes built-ins and runs external programs.
///
/// Each line is handled in one of two modes. Without `&` it is a single
/// command: built-ins are looked up first, anything else has its redirection
/// split off and runs as a child process the shell waits for. With `&` the
/// line is cut into segments that are all spawned left to right before the
/// shell waits for every one of them. Built-ins are not recognized inside
/// such segments; they go through path resolution like any other name.
///
/// Errors never stop the interpreter. Each one is logged and reported as the
/// fixed [`ERROR_MESSAGE`]; only `exit` and end of input end a session.
///
/// Example
/// ```
/// use wish::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut errors = Vec::new();
/// sh.execute_line_with_redefined_errors("path", &mut errors).unwrap();
/// sh.execute_line_with_redefined_errors("ls", &mut errors).unwrap();
/// assert_eq!(errors, b"An error has occurred\n");
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
    prompt: String,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of built-in factories.
    pub fn new(builtins: Vec<Box<dyn CommandFactory>>, settings: &ShellSettings) -> Self {
        Self {
            env: Environment::new(SearchPath::new(&settings.search_path)),
            builtins,
            prompt: settings.prompt.clone(),
        }
    }

    /// Create an interpreter with the standard built-ins: `exit`, `cd` and `path`.
    pub fn with_settings(settings: &ShellSettings) -> Self {
        use crate::builtin::*;
        Self::new(
            vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Path>::default()),
            ],
            settings,
        )
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// True once `exit` has run; no further lines should be read.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Execute one raw input line, reporting failures on stderr.
    pub fn execute_line(&mut self, line: &str) -> io::Result<()> {
        self.execute_line_with_redefined_errors(line, &mut io::stderr())
    }

    /// Execute one raw input line, reporting failures to `errors`.
    ///
    /// Returns once every process started for the line has terminated. The
    /// only error returned is a failure to write to `errors`.
    pub fn execute_line_with_redefined_errors(
        &mut self,
        line: &str,
        errors: &mut dyn Write,
    ) -> io::Result<()> {
        if lexer::is_parallel(line) {
            self.run_parallel(line, errors)
        } else {
            match self.run_single(line) {
                Ok(()) => Ok(()),
                Err(e) => report(errors, &e),
            }
        }
    }

    fn run_single(&mut self, line: &str) -> Result<(), ShellError> {
        let argv = lexer::split_into_tokens(line);
        let Some(name) = argv.first() else {
            return Ok(());
        };

        let args: Vec<&str> = argv[1..].iter().map(String::as_str).collect();
        for factory in &self.builtins {
            if let Some(cmd) = factory.try_create(name, &args) {
                cmd.execute(&mut self.env)?;
                return Ok(());
            }
        }

        let group = parser::resolve_redirection(argv)?;
        let cmd = ExternalCommand::prepare(&self.env.search_path, group)?;
        Box::new(cmd).execute(&mut self.env)?;
        Ok(())
    }

    fn run_parallel(&mut self, line: &str, errors: &mut dyn Write) -> io::Result<()> {
        let mut children: Vec<Child> = Vec::new();
        let mut result = Ok(());

        for segment in lexer::split_into_segments(line) {
            let argv = lexer::split_into_tokens(segment);
            if argv.is_empty() {
                continue;
            }
            match self.spawn_segment(argv) {
                Ok(child) => children.push(child),
                Err(e) => {
                    if let Err(io_err) = report(errors, &e) {
                        result = Err(io_err);
                    }
                }
            }
        }

        log::debug!("waiting for {} parallel children", children.len());
        for mut child in children {
            if let Err(e) = external::wait_for(&mut child) {
                if let Err(io_err) = report(errors, &e) {
                    result = Err(io_err);
                }
            }
        }
        result
    }

    fn spawn_segment(&self, argv: lexer::ArgumentVector) -> Result<Child, ShellError> {
        let group = parser::resolve_redirection(argv)?;
        ExternalCommand::prepare(&self.env.search_path, group)?.spawn()
    }

    /// Run every line of a script until end of input or `exit`.
    ///
    /// No prompt is printed. A failing line is reported to `errors` and the
    /// script carries on with the next one. Bytes that are not valid UTF-8
    /// are replaced with U+FFFD, so such a line still runs (and usually fails
    /// on its own) without ending the script.
    pub fn run_script<R: BufRead>(
        &mut self,
        mut input: R,
        errors: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf).context("reading script")? == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(&buf);
            self.execute_line_with_redefined_errors(&line, errors)?;
            if self.should_exit() {
                break;
            }
        }
        Ok(())
    }

    /// Interactive Read-Eval-Print Loop.
    ///
    /// Ends on `exit`, end of input or an interrupt.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.should_exit() {
            match rl.readline(&self.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.execute_line(&line)?;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter from the embedded default configuration.
    fn default() -> Self {
        Self::with_settings(&crate::config::Config::default_config().shell)
    }
}

/// Log the detailed error and print the fixed diagnostic.
fn report(errors: &mut dyn Write, err: &ShellError) -> io::Result<()> {
    log::warn!("{:?} error: {}", err.kind(), err);
    errors.write_all(ERROR_MESSAGE.as_bytes())?;
    errors.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::lock_current_dir;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    fn system_interpreter() -> Interpreter {
        Interpreter::with_settings(&ShellSettings {
            prompt: String::new(),
            search_path: vec!["/bin".into(), "/usr/bin".into()],
        })
    }

    fn make_unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "wish_interp_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn run(sh: &mut Interpreter, line: &str) -> usize {
        let mut errors = Vec::new();
        sh.execute_line_with_redefined_errors(line, &mut errors).unwrap();
        let text = String::from_utf8(errors).unwrap();
        assert_eq!(text.len() % ERROR_MESSAGE.len(), 0);
        text.matches(ERROR_MESSAGE).count()
    }

    #[test]
    fn test_blank_lines_do_nothing() {
        let mut sh = system_interpreter();
        assert_eq!(run(&mut sh, ""), 0);
        assert_eq!(run(&mut sh, " \t "), 0);
        assert_eq!(run(&mut sh, " & \t& "), 0);
    }

    #[test]
    fn test_default_search_path() {
        let sh = Interpreter::default();
        assert_eq!(sh.env().search_path, SearchPath::new(["/bin"]));
    }

    #[test]
    fn test_external_with_redirect() {
        let dir = make_unique_temp_dir("redirect");
        let out = dir.join("out.txt");
        let mut sh = system_interpreter();

        assert_eq!(run(&mut sh, &format!("echo hi there > {}", out.display())), 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hi there\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_malformed_redirect_does_not_run() {
        let dir = make_unique_temp_dir("malformed");
        let a = dir.join("a");
        let b = dir.join("b");
        let mut sh = system_interpreter();

        assert_eq!(run(&mut sh, "echo >"), 1);
        assert_eq!(
            run(&mut sh, &format!("echo hi > {} {}", a.display(), b.display())),
            1
        );
        assert!(!a.exists());
        assert!(!b.exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_empty_path_disables_external_commands() {
        let mut sh = system_interpreter();
        assert_eq!(run(&mut sh, "true"), 0);
        assert_eq!(run(&mut sh, "path"), 0);
        assert!(sh.env().search_path.is_empty());
        assert_eq!(run(&mut sh, "true"), 1);
        assert_eq!(run(&mut sh, "path /bin /usr/bin"), 0);
        assert_eq!(run(&mut sh, "true"), 0);
    }

    #[test]
    fn test_exit() {
        let mut sh = system_interpreter();
        assert_eq!(run(&mut sh, "exit extra"), 1);
        assert!(!sh.should_exit());
        assert_eq!(run(&mut sh, "  exit  "), 0);
        assert!(sh.should_exit());
    }

    #[test]
    fn test_builtins_see_redirection_tokens() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let mut sh = system_interpreter();

        assert_eq!(run(&mut sh, "cd / > out"), 1);
        assert_eq!(std::env::current_dir().unwrap(), orig);

        assert_eq!(run(&mut sh, "path /bin > out"), 0);
        assert_eq!(sh.env().search_path, SearchPath::new(["/bin", ">", "out"]));
    }

    #[test]
    fn test_cd_errors_leave_cwd() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let mut sh = system_interpreter();

        assert_eq!(run(&mut sh, "cd"), 1);
        assert_eq!(run(&mut sh, "cd / /tmp"), 1);
        assert_eq!(run(&mut sh, "cd /nonexistent_wish_dir"), 1);
        assert_eq!(std::env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_changes_where_children_run() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let dir = make_unique_temp_dir("cd");
        let canonical = fs::canonicalize(&dir).unwrap();
        let mut sh = system_interpreter();

        let errors = run(&mut sh, &format!("cd {}", canonical.display()))
            + run(&mut sh, "pwd > where.txt");
        let contents = fs::read_to_string(canonical.join("where.txt"));
        std::env::set_current_dir(&orig).unwrap();

        assert_eq!(errors, 0);
        assert_eq!(contents.unwrap().trim_end(), canonical.to_string_lossy());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_parallel_runs_concurrently() {
        let mut sh = system_interpreter();
        let start = Instant::now();
        assert_eq!(run(&mut sh, "sleep 1 & sleep 1 & sleep 1"), 0);
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(1), "returned before children finished");
        assert!(elapsed < Duration::from_millis(2500), "took {:?}", elapsed);
    }

    #[test]
    fn test_parallel_redirects_each_segment() {
        let dir = make_unique_temp_dir("parallel");
        let a = dir.join("a.txt");
        let b = dir.join("b.txt");
        let mut sh = system_interpreter();

        let line = format!("echo one > {} & echo two > {}", a.display(), b.display());
        assert_eq!(run(&mut sh, &line), 0);
        assert_eq!(fs::read_to_string(&a).unwrap(), "one\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "two\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_parallel_failures_are_per_segment() {
        let dir = make_unique_temp_dir("partial");
        let ok = dir.join("ok.txt");
        let mut sh = system_interpreter();

        let line = format!(
            "nonexisting_wish_cmd & echo done > {} & echo > ",
            ok.display()
        );
        assert_eq!(run(&mut sh, &line), 2);
        assert_eq!(fs::read_to_string(&ok).unwrap(), "done\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_parallel_does_not_recognize_builtins() {
        let mut sh = system_interpreter();
        sh.env.search_path = SearchPath::default();

        assert_eq!(run(&mut sh, "exit & path /bin"), 2);
        assert!(!sh.should_exit());
        assert!(sh.env().search_path.is_empty());
    }

    #[test]
    fn test_script_continues_after_error() {
        let dir = make_unique_temp_dir("script");
        let out = dir.join("out.txt");
        let script = format!(
            "echo broken > a b\n\necho fine > {}\nexit\necho unreachable > {}\n",
            out.display(),
            out.display()
        );
        let mut sh = system_interpreter();
        let mut errors = Vec::new();

        sh.run_script(Cursor::new(script), &mut errors).unwrap();

        assert_eq!(errors, ERROR_MESSAGE.as_bytes());
        assert_eq!(fs::read_to_string(&out).unwrap(), "fine\n");
        assert!(sh.should_exit());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_exit_with_dashes_is_usage_error() {
        let mut sh = system_interpreter();
        assert_eq!(run(&mut sh, "exit --"), 1);
        assert_eq!(run(&mut sh, "exit --help"), 1);
        assert!(!sh.should_exit());
    }

    #[test]
    fn test_script_survives_invalid_utf8() {
        let dir = make_unique_temp_dir("utf8");
        let out = dir.join("out.txt");
        let mut script = b"echo \xff\xfe > ".to_vec();
        script.extend_from_slice(dir.join("bad.txt").to_string_lossy().as_bytes());
        script.extend_from_slice(format!("\necho fine > {}\r\n", out.display()).as_bytes());
        let mut sh = system_interpreter();
        let mut errors = Vec::new();

        sh.run_script(Cursor::new(script), &mut errors).unwrap();

        assert!(errors.is_empty());
        assert_eq!(fs::read_to_string(&out).unwrap(), "fine\n");
        assert_eq!(
            fs::read_to_string(dir.join("bad.txt")).unwrap(),
            "\u{FFFD}\u{FFFD}\n"
        );

        let _ = fs::remove_dir_all(dir);
    }
}
