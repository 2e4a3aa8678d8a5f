use log::{error, info, LevelFilter};

// For file-based logging with rotation
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::LogLevel;
use crate::types::StyleId;

/// Environment variable that overrides the configured log level
pub const LOG_ENV_VAR: &str = "STYLE_MERGER_LOG";

/// Initialize the logger with timestamp, log level, and module path
/// Logs are written to a rotating file so they do not interleave with CLI output
pub fn init_logger(log_dir: &str, level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let log_file_path = format!("{}/style-merger.log", log_dir);
    let archived_logs_pattern = format!("{}/style-merger.{{}}.log", log_dir);

    // Rotate at 10MB
    let file_trigger = SizeTrigger::new(10 * 1024 * 1024);

    // Keep 5 archived log files
    let file_roller = FixedWindowRoller::builder()
        .build(&archived_logs_pattern, 5)
        .map_err(|e| format!("Failed to create log roller: {}", e))?;

    let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
        )))
        .build(log_file_path.clone(), Box::new(compound_policy))
        .map_err(|e| format!("Failed to create log appender: {}", e))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .build(Root::builder().appender("file").build(LevelFilter::Trace))
        .map_err(|e| format!("Failed to build log config: {}", e))?;

    log4rs::init_config(config).map_err(|e| format!("Failed to initialize log4rs: {}", e))?;

    let level = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| level.into());
    log::set_max_level(level);

    info!("Style merger started");
    info!("Logging to file: {}", log_file_path);
    Ok(())
}

/// Log a Designer API call that failed
pub fn log_host_error(operation: &str, error: &dyn std::error::Error) {
    error!(
        "Designer API call failed - Operation: {}, Error: {}",
        operation, error
    );
}

/// Log a change made to the site's styles or elements
pub fn log_style_modification(operation: &str, style: &StyleId, details: Option<&str>) {
    let details_str = details.unwrap_or("");
    info!(
        "STYLE CHANGE - Operation: {}, Style: {}{}",
        operation,
        style,
        if details_str.is_empty() {
            "".to_string()
        } else {
            format!(", Details: {}", details_str)
        }
    );
}
