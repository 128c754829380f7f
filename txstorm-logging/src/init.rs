use anyhow::{anyhow, Result};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use txstorm_config::{LogFormat, LogLevel, LoggingConfig};

/// Environment variable consulted when no level is given on the command line.
///
/// This is the only environment source for the level; it beats
/// `logging.level` from the config file and loses to `--log-level`.
pub const LOG_LEVEL_ENV: &str = "TXSTORM_LOGLEVEL";

/// Pick the effective level: explicit override, then `TXSTORM_LOGLEVEL`,
/// then the configured level.
///
/// An unparsable env value is ignored; an unparsable override is an error.
pub fn resolve_level(override_level: Option<&str>, config: &LoggingConfig) -> Result<LogLevel> {
    if let Some(level) = override_level {
        return LogLevel::from_str(level).map_err(|e| anyhow!(e));
    }

    match env_level() {
        Some(Ok(level)) => Ok(level),
        _ => Ok(config.level),
    }
}

fn env_level() -> Option<Result<LogLevel, String>> {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .map(|level| LogLevel::from_str(&level))
}

/// Initialize the global tracing subscriber from configuration
pub fn init_logging(config: &LoggingConfig, override_level: Option<&str>) -> Result<()> {
    let level = resolve_level(override_level, config)?;
    init_tracing(level, config.format)?;

    if override_level.is_none() {
        if let Some(Err(e)) = env_level() {
            tracing::warn!(%level, "Ignoring {}: {}", LOG_LEVEL_ENV, e);
        }
    }
    Ok(())
}

/// Initialize a fmt subscriber at `level` in the given format.
///
/// Repeated calls are harmless; only the first installs a subscriber.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_new(level.to_string())
        .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().with_thread_ids(true).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_env::with_var;

    fn config(level: LogLevel) -> LoggingConfig {
        LoggingConfig {
            level,
            format: LogFormat::Text,
        }
    }

    #[test]
    fn test_override_wins() {
        with_var(LOG_LEVEL_ENV, Some("error"), || {
            let level = resolve_level(Some("debug"), &config(LogLevel::Info)).unwrap();
            assert_eq!(level, LogLevel::Debug);
        });
    }

    #[test]
    fn test_env_beats_config() {
        with_var(LOG_LEVEL_ENV, Some("TRACE"), || {
            let level = resolve_level(None, &config(LogLevel::Info)).unwrap();
            assert_eq!(level, LogLevel::Trace);
        });
    }

    #[test]
    fn test_bad_env_falls_back_to_config() {
        with_var(LOG_LEVEL_ENV, Some("chatty"), || {
            let level = resolve_level(None, &config(LogLevel::Info)).unwrap();
            assert_eq!(level, LogLevel::Info);
        });
    }

    #[test]
    fn test_default_is_warn() {
        with_var(LOG_LEVEL_ENV, None::<&str>, || {
            let level = resolve_level(None, &LoggingConfig::default()).unwrap();
            assert_eq!(level, LogLevel::Warn);
        });
    }

    #[test]
    fn test_bad_override_is_error() {
        assert!(resolve_level(Some("chatty"), &LoggingConfig::default()).is_err());
    }

    #[test]
    fn test_bad_env_does_not_fail_init() {
        with_var(LOG_LEVEL_ENV, Some("chatty"), || {
            assert!(matches!(env_level(), Some(Err(_))));
            init_logging(&config(LogLevel::Info), None).unwrap();
        });
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(LogLevel::Warn, LogFormat::Compact).unwrap();
        init_tracing(LogLevel::Debug, LogFormat::Pretty).unwrap();
    }
}
