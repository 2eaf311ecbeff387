//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate engine tuning and time source settings
//! - Produce `ClockSyncSettings`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_from_path(Path::new("clock_sync.toml")).unwrap();
//! println!("Source: {}", settings.source.kind());
//! ```

mod parser;
mod validator;

pub use contracts::ClockSyncSettings;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Format comes from the extension (.toml / .json); files without one are
    /// sniffed from their content.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported extension
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ClockSyncSettings, ContractError> {
        let content = std::fs::read_to_string(path)?;
        let format = ConfigFormat::detect(path, &content)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ClockSyncSettings, ContractError> {
        let settings = format.parse(content)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Validate settings built in code (e.g. from CLI flags)
    pub fn validate(settings: &ClockSyncSettings) -> Result<(), ContractError> {
        validator::validate(settings)
    }

    /// Serialize settings to TOML string
    pub fn to_toml(settings: &ClockSyncSettings) -> Result<String, ContractError> {
        ConfigFormat::Toml.render(settings)
    }

    /// Serialize settings to JSON string
    pub fn to_json(settings: &ClockSyncSettings) -> Result<String, ContractError> {
        ConfigFormat::Json.render(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceConfig;
    use std::io::Write;

    const SIMULATED_TOML: &str = r#"
[clock_sync]
max_samples = 6
interval_ms = 100
max_consecutive_errors = 3
request_timeout_ms = 1500

[source]
kind = "simulated"
true_offset_s = 42.5
max_send_ms = 20
max_receive_ms = 30
seed = 11
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(SIMULATED_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let settings = result.unwrap();
        assert_eq!(settings.clock_sync.max_samples, 6);
        assert_eq!(settings.source.kind(), "simulated");
    }

    #[test]
    fn test_round_trip_toml() {
        let settings = ConfigLoader::load_from_str(SIMULATED_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&settings).unwrap();
        let reloaded = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(settings, reloaded);
    }

    #[test]
    fn test_round_trip_json() {
        let settings = ConfigLoader::load_from_str(SIMULATED_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&settings).unwrap();
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(settings, reloaded);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[clock_sync]
request_timeout_ms = 0

[source]
kind = "rfc868"
host = "localhost"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[source]
kind = "rfc868"
host = "127.0.0.1"
port = 3737
"#,
        )
        .unwrap();

        let settings = ConfigLoader::load_from_path(file.path()).unwrap();
        match settings.source {
            SourceConfig::Rfc868(rfc868) => assert_eq!(rfc868.port, 3737),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_extensionless_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "source": { "kind": "simulated", "true_offset_s": 2.5 } }"#)
            .unwrap();

        let settings = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(settings.source.kind(), "simulated");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/clock_sync.toml"))
            .unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }
}
