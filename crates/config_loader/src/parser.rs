//! 配置解析与序列化
//!
//! TOML 为主要格式，JSON 作为备选；文件无扩展名时按内容推断。

use std::path::Path;

use contracts::{ClockSyncSettings, ContractError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 按内容推断：首个非空白字符为 `{` 视为 JSON
    pub fn sniff(content: &str) -> Self {
        match content.trim_start().chars().next() {
            Some('{') => Self::Json,
            _ => Self::Toml,
        }
    }

    /// 确定文件格式；有扩展名时必须是受支持的格式
    pub(crate) fn detect(path: &Path, content: &str) -> Result<Self, ContractError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext).ok_or_else(|| {
                ContractError::config_parse(format!("unsupported config format: .{ext}"))
            }),
            None => Ok(Self::sniff(content)),
        }
    }

    /// 解析为 `ClockSyncSettings` (不做校验)
    pub fn parse(self, content: &str) -> Result<ClockSyncSettings, ContractError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| self.error("parse", e)),
            Self::Json => serde_json::from_str(content).map_err(|e| self.error("parse", e)),
        }
    }

    /// 序列化为该格式的文本
    pub fn render(self, settings: &ClockSyncSettings) -> Result<String, ContractError> {
        match self {
            Self::Toml => toml::to_string_pretty(settings).map_err(|e| self.error("serialize", e)),
            Self::Json => {
                serde_json::to_string_pretty(settings).map_err(|e| self.error("serialize", e))
            }
        }
    }

    fn error<E>(self, action: &str, e: E) -> ContractError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ContractError::ConfigParse {
            message: format!("{self:?} {action} error: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceConfig;

    #[test]
    fn test_parse_toml_rfc868() {
        let content = r#"
[clock_sync]
max_samples = 8
interval_ms = 250

[source]
kind = "rfc868"
host = "time.example.net"
"#;
        let result = ConfigFormat::Toml.parse(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let settings = result.unwrap();
        assert_eq!(settings.clock_sync.max_samples, 8);
        assert_eq!(settings.clock_sync.interval_ms, 250);
        assert_eq!(settings.clock_sync.max_consecutive_errors, 2);
        match settings.source {
            SourceConfig::Rfc868(rfc868) => {
                assert_eq!(rfc868.host, "time.example.net");
                assert_eq!(rfc868.port, 37);
                assert_eq!(rfc868.connect_timeout_ms, 2000);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_missing_clock_sync_table_uses_defaults() {
        let content = r#"
[source]
kind = "simulated"
true_offset_s = 5.0
"#;
        let settings = ConfigFormat::Toml.parse(content).unwrap();
        assert_eq!(settings.clock_sync, contracts::ClockSyncConfig::default());
        assert!(matches!(settings.source, SourceConfig::Simulated(_)));
    }

    #[test]
    fn test_parse_json_simulated() {
        let content = r#"{
            "clock_sync": { "max_samples": 3, "request_timeout_ms": 500 },
            "source": {
                "kind": "simulated",
                "true_offset_s": -2000.0,
                "max_send_ms": 500,
                "max_receive_ms": 750,
                "seed": 7
            }
        }"#;
        let settings = ConfigFormat::Json.parse(content).unwrap();
        assert_eq!(settings.clock_sync.request_timeout_ms, Some(500));
        match settings.source {
            SourceConfig::Simulated(sim) => {
                assert_eq!(sim.true_offset_s, -2000.0);
                assert_eq!(sim.seed, Some(7));
                assert!(!sim.fixed_latency);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_unknown_source_kind_is_parse_error() {
        let content = r#"
[source]
kind = "ntp"
host = "pool.ntp.org"
"#;
        let err = ConfigFormat::Toml.parse(content).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("Toml parse error"));
    }

    #[test]
    fn test_sniff_and_detect() {
        assert_eq!(ConfigFormat::sniff("  \n{ \"source\": {} }"), ConfigFormat::Json);
        assert_eq!(ConfigFormat::sniff("[source]\nkind = \"rfc868\""), ConfigFormat::Toml);

        assert_eq!(
            ConfigFormat::detect(Path::new("clock.JSON"), "").unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::detect(Path::new("clock"), "{}").unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::detect(Path::new("clock.yaml"), "").is_err());
    }
}
