//! Logging setup for the CLI.
//!
//! Console output honours RUST_LOG (info by default); every run also gets
//! its own timestamped log file under the log directory with full debug
//! detail for post-mortems.

use std::path::Path;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Initializes console + file logging. Returns the log file path.
pub fn setup(log_dir: &Path) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;
    let log_file = log_dir.join(format!("mixcut_{}.log", get_timestamp()));

    let console_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(
            fern::Dispatch::new()
                .level(console_level)
                .chain(std::io::stdout()),
        )
        .chain(
            fern::Dispatch::new()
                .level(log::LevelFilter::Debug)
                .chain(fern::log_file(&log_file)?),
        )
        .apply()?;

    Ok(log_file)
}
