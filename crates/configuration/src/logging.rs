use crate::error::ConfigError;
use crate::settings::{LogFormat, LoggingSettings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber.
///
/// Console output is always on. When `settings.directory` is set, the same
/// events are also written to a daily rolling file through a non-blocking
/// writer; the returned guard must be kept alive until shutdown so buffered
/// lines get flushed.
pub fn init_logging(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    let (full, compact) = match settings.format {
        LogFormat::Full => (Some(fmt::layer().with_target(false)), None),
        LogFormat::Compact => (None, Some(fmt::layer().compact().with_target(false))),
    };

    let (file_layer, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(full)
        .with(compact)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_reported() {
        let settings = LoggingSettings {
            level: "query_lab=loud".to_string(),
            format: LogFormat::Compact,
            directory: None,
            file_prefix: "query-lab.log".to_string(),
        };
        unsafe { std::env::remove_var("RUST_LOG") };
        assert!(matches!(init_logging(&settings), Err(ConfigError::LoggingError(_))));
    }
}
