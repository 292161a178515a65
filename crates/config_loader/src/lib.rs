//! # Config Loader
//!
//! Reads an emitter configuration file and checks it before any socket is
//! opened. Every section and key is optional:
//!
//! ```toml
//! prefix = "checkout"
//!
//! [dispatcher]
//! queue_size = 1000        # points buffered before new ones are dropped
//! flush_interval_ms = 0    # debounce window after the first point
//! retry_interval_ms = 1000 # pause after a failed send
//!
//! [transport]
//! host = "127.0.0.1"
//! port = 2003
//! kind = "udp"             # tcp | udp
//! codec = "plain"          # plain | gzip
//! ```
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("emitter.toml")).unwrap();
//! println!("Collector: {}", config.transport.endpoint());
//! ```

mod parser;
mod validator;

pub use contracts::EmitterConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Entry point for loading and checking [`EmitterConfig`]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate a `.toml` or `.json` file
    ///
    /// # Errors
    /// Unknown extension, I/O failure, parse failure or a rule violation.
    pub fn load_from_path(path: &Path) -> Result<EmitterConfig, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and validate in-memory content
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<EmitterConfig, ContractError> {
        let config = format.parse(content)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Re-check a configuration after it was modified in code (e.g. CLI overrides)
    pub fn validate(config: &EmitterConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    pub fn to_toml(config: &EmitterConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(config: &EmitterConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
prefix = "svc"

[dispatcher]
queue_size = 200
flush_interval_ms = 100
max_batch_size = 50

[transport]
host = "10.0.0.5"
port = 2013
kind = "tcp"
codec = "gzip"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.transport.endpoint(), "10.0.0.5:2013");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = "[dispatcher]\nqueue_size = 0\n";
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("queue_size"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.prefix.as_deref(), Some("svc"));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/emitter.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
