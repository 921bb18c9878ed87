use std::path::PathBuf;

/// Settings for the tracing subscriber, read before anything else so that
/// start-up problems are logged.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub environment: String,
    /// Level for this crate's targets; defaults by environment.
    pub level: Option<String>,
    pub directory: PathBuf,
}

impl LogConfig {
    /// Reads `ENVIRONMENT`, `LOG_LEVEL` and `LOG_DIR`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            level: lookup("LOG_LEVEL").filter(|s| !s.trim().is_empty()),
            directory: lookup("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn level(&self) -> &str {
        match &self.level {
            Some(level) => level,
            None if self.is_production() => "info",
            None => "debug",
        }
    }

    /// Default filter directive when `RUST_LOG` is unset.
    pub fn filter_directive(&self) -> String {
        format!(
            "{}={},tower_http=debug,axum=debug",
            env!("CARGO_CRATE_NAME"),
            self.level()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = LogConfig::from_lookup(|_| None);
        assert!(!config.is_production());
        assert_eq!(config.level(), "debug");
        assert_eq!(config.directory, PathBuf::from("logs"));
        assert_eq!(
            config.filter_directive(),
            "topvibes_backend=debug,tower_http=debug,axum=debug"
        );
    }

    #[test]
    fn test_production_and_explicit_level() {
        let prod = LogConfig::from_lookup(|key| match key {
            "ENVIRONMENT" => Some("production".to_string()),
            _ => None,
        });
        assert!(prod.is_production());
        assert_eq!(prod.level(), "info");

        let explicit = LogConfig::from_lookup(|key| match key {
            "ENVIRONMENT" => Some("production".to_string()),
            "LOG_LEVEL" => Some("warn".to_string()),
            _ => None,
        });
        assert_eq!(explicit.level(), "warn");
    }
}
