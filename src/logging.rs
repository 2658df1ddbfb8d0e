use crate::config::LoggingSettings;
use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;

/// Install the global logger described by `settings`.
///
/// Records only ever go to a file: the terminal's error stream carries the
/// shell's fixed diagnostic and nothing else. Without a file, or with level
/// `off`, no logger is installed and the `log` macros are no-ops.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    if settings.level == LevelFilter::Off {
        return Ok(());
    }
    let Some(path) = &settings.file else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(settings.level, config, file).context("installing logger")?;
    log::info!("wish {} started", env!("CARGO_PKG_VERSION"));
    Ok(())
}
