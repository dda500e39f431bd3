//! log4rs wiring: rolling `app.log`, `audit.log` and `metrics.log`, plus an optional
//! `dev6.log` for developer bench lines.

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

type LogResult = Result<(), Box<dyn std::error::Error>>;

const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Initializes logging from a log4rs YAML file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already installed.
pub fn init_path(path: &Path) -> LogResult {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Configure logging globally for the process.
/// - dir: base directory for logs; if None, current directory.
/// - level: error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>, retention: Option<u32>) -> LogResult {
    configure_logging_with_dev(dir, level, retention, false)
}

/// Like [`configure_logging`]; with `enable_dev6`, `dev6!` lines (target
/// `recordlite::dev6`) are also persisted to `dev6.log`.
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created.
pub fn configure_logging_with_dev(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    enable_dev6: bool,
) -> LogResult {
    let base = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&base)?;
    let keep = retention.unwrap_or(7);
    let lvl = parse_level(level);

    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(&base, "audit", keep)?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(&base, "metrics", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build("recordlite::audit", lvl))
        .logger(
            Logger::builder().appender("metrics").additive(false).build("recordlite::metrics", lvl),
        );

    if enable_dev6 {
        builder = builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(&base, "dev6", keep)?)))
            .logger(
                Logger::builder()
                    .appender("dev6")
                    .additive(false)
                    .build("recordlite::dev6", LevelFilter::Trace),
            );
    } else {
        builder = builder
            .logger(Logger::builder().additive(false).build("recordlite::dev6", LevelFilter::Off));
    }

    let config = builder.build(Root::builder().appender("app").build(lvl))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - `RECORDLITE_LOG_DIR`
/// - `RECORDLITE_LOG_LEVEL`
/// - `RECORDLITE_LOG_RETENTION`
/// - `RECORDLITE_DEV6` (1/true/yes)
///
/// # Errors
/// Returns an error if logging cannot be configured.
pub fn configure_from_env() -> LogResult {
    let dir = std::env::var("RECORDLITE_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("RECORDLITE_LOG_LEVEL").ok();
    let retention =
        std::env::var("RECORDLITE_LOG_RETENTION").ok().and_then(|s| s.parse::<u32>().ok());
    let dev6_enabled = std::env::var("RECORDLITE_DEV6")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging_with_dev(dir.as_deref(), level.as_deref(), retention, dev6_enabled)
}
