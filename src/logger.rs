//! log4rs wiring: rolling `app.log`, `audit.log` (writes) and `metrics.log`
//! (query telemetry), plus an optional `dev.log` for developer traces.

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

use crate::config::LogConfig;

pub const AUDIT_TARGET: &str = "cinelite::audit";
pub const METRICS_TARGET: &str = "cinelite::metrics";
pub const DEV_TARGET: &str = "cinelite::dev";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Initializes the logging system from a `log4rs.yaml` file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already set.
pub fn init_path(path: &Path) -> Result<(), BoxError> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, BoxError> {
    let roller = FixedWindowRoller::builder().build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Builds the appender configuration without installing it.
///
/// # Errors
/// Returns an error if the directory or a log file cannot be created.
pub fn build_config(dir: &Path, level: LevelFilter, retention: usize, enable_dev: bool) -> Result<Config, BoxError> {
    std::fs::create_dir_all(dir)?;
    let keep = u32::try_from(retention.max(1)).unwrap_or(u32::MAX);
    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(dir, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(dir, "audit", keep)?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(dir, "metrics", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, level))
        .logger(Logger::builder().appender("metrics").additive(false).build(METRICS_TARGET, level));
    builder = if enable_dev {
        builder
            .appender(Appender::builder().build("dev", Box::new(rolling(dir, "dev", keep)?)))
            .logger(Logger::builder().appender("dev").additive(false).build(DEV_TARGET, LevelFilter::Trace))
    } else {
        builder.logger(Logger::builder().additive(false).build(DEV_TARGET, LevelFilter::Off))
    };
    Ok(builder.build(Root::builder().appender("app").build(level))?)
}

/// Configure logging globally for the process.
/// - dir: base directory for logs; if None, current directory.
/// - level: off|error|warn|info|debug|trace
/// - retention: number of rolled files to keep
///
/// # Errors
/// Returns an error if the files cannot be created or a logger is already installed.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>, retention: Option<usize>, enable_dev: bool) -> Result<(), BoxError> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let config = build_config(&base, parse_level(level.unwrap_or("info")), retention.unwrap_or(7), enable_dev)?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from a resolved [`LogConfig`]; a `config_file` takes precedence.
///
/// # Errors
/// See [`configure_logging`] and [`init_path`].
pub fn configure(cfg: &LogConfig) -> Result<(), BoxError> {
    if let Some(file) = &cfg.config_file {
        return init_path(file);
    }
    configure_logging(cfg.dir.as_deref(), Some(&cfg.level), Some(cfg.retention), dev_enabled_from_env())
}

/// Configure logging from environment variables if present:
/// - `CINELITE_LOG_DIR`
/// - `CINELITE_LOG_LEVEL`
/// - `CINELITE_LOG_RETENTION`
/// - `CINELITE_DEV_LOG`
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), BoxError> {
    let dir = std::env::var("CINELITE_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("CINELITE_LOG_LEVEL").ok();
    let retention = std::env::var("CINELITE_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    configure_logging(dir.as_deref(), level.as_deref(), retention, dev_enabled_from_env())
}

fn dev_enabled_from_env() -> bool {
    std::env::var("CINELITE_DEV_LOG")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
