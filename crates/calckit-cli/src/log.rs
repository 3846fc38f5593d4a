//! Logger setup for the CLI.
//!
//! Everything is written to stderr so that stdout only ever carries the
//! computation output, which keeps `--output csv` and `--output json` pipeable.
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::error::Error;
use std::fmt::{Arguments, Display};
use std::io::IsTerminal;

/// Environment variable overriding `--log-level`.
const LOG_LEVEL_ENV: &str = "CALCKIT_LOG_LEVEL";

/// Used when neither the flag nor the environment variable is set.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Initialise the `fern` logger.
///
/// The level comes from `CALCKIT_LOG_LEVEL` if set, then `--log-level`, then
/// the default (`warn`). Possible values are `off`, `error`, `warn`, `info`,
/// `debug` and `trace`.
pub fn init(log_level_from_flag: Option<&str>) -> Result<(), Box<dyn Error>> {
    let log_level = env::var(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| log_level_from_flag.unwrap_or(DEFAULT_LOG_LEVEL).to_string());
    let log_level = parse_level(&log_level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour = std::io::stderr().is_terminal();

    Dispatch::new()
        .format(move |out, message, record| {
            write_log_colour(out, message, record, use_colour, &colours);
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter, Box<dyn Error>> {
    match level.trim().to_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        unknown => Err(format!("Unknown log level: {unknown}").into()),
    }
}

fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log(out, record.level(), record.target(), message);
    }
}
