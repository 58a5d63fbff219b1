use skychart_core::LoggingConfig;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Format named by `logging.format`; unrecognized values read as pretty
    pub fn from_config(config: &LoggingConfig) -> Self {
        match config.format.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(config: &LoggingConfig) -> String {
    format!("skychart={}", config.level.to_lowercase())
}

/// Install the global subscriber. Output goes to stderr so stdout stays
/// reserved for results.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let format = LogFormat::from_config(config);
    let json_layer = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let pretty_layer = (format == LogFormat::Pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(false)
            .with_writer(std::io::stderr)
    });
    let compact_layer = (format == LogFormat::Compact).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(compact_layer)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(level: &str, format: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            format: format.to_string(),
        }
    }

    #[test]
    fn test_default_directive_uses_configured_level() {
        assert_eq!(default_directive(&logging("DEBUG", "pretty")), "skychart=debug");
    }

    #[test]
    fn test_each_accepted_format_selects_its_layer() {
        assert_eq!(LogFormat::from_config(&logging("info", "pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_config(&logging("info", "compact")), LogFormat::Compact);
        assert_eq!(LogFormat::from_config(&logging("info", "JSON")), LogFormat::Json);
        assert_eq!(
            LogFormat::from_config(&LoggingConfig::default()),
            LogFormat::Pretty
        );
    }
}
