use anyhow::{Context, Result, bail};
use argh::FromArgs;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use wish::Interpreter;
use wish::config::Config;
use wish::error::ERROR_MESSAGE;

#[derive(FromArgs)]
/// A small shell. Reads commands from the terminal, or from SCRIPT when given.
struct Args {
    #[argh(positional, greedy)]
    /// script to run instead of reading from the terminal.
    script: Vec<PathBuf>,
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let name = argv.first().map(String::as_str).unwrap_or("wish");
    // The only argument is a script path, whatever it looks like: `help`,
    // `--help` and `--` all name files.
    let rest: Vec<&str> = std::iter::once("--")
        .chain(argv.iter().skip(1).map(String::as_str))
        .collect();

    match Args::from_args(&[name], &rest) {
        Ok(args) => args,
        Err(_) => fail(),
    }
}

fn run(args: Args) -> Result<()> {
    if args.script.len() > 1 {
        bail!("expected at most one script, got {}", args.script.len());
    }

    let config = Config::load()?;
    wish::logging::init(&config.logging)?;

    let mut sh = Interpreter::with_settings(&config.shell);
    match args.script.first() {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening script {}", path.display()))?;
            sh.run_script(BufReader::new(file), &mut io::stderr())
        }
        None => sh.repl(),
    }
}

fn fail() -> ! {
    let _ = io::stderr().write_all(ERROR_MESSAGE.as_bytes());
    std::process::exit(1);
}

fn main() {
    if let Err(e) = run(parse_args()) {
        log::error!("{:#}", e);
        fail();
    }
}
