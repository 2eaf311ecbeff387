//! 配置校验模块
//!
//! 校验规则：
//! - clock_sync: max_samples > 0, event_name 非空, request_timeout_ms > 0
//! - rfc868: host 非空, port > 0, connect_timeout_ms > 0
//! - simulated: true_offset_s 有限, failure_rate ∈ [0, 1]

use contracts::{ClockSyncSettings, ContractError, SourceConfig};

/// 校验 ClockSyncSettings 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(settings: &ClockSyncSettings) -> Result<(), ContractError> {
    settings.clock_sync.validate()?;
    validate_source(&settings.source)?;
    Ok(())
}

/// 校验时间源配置
fn validate_source(source: &SourceConfig) -> Result<(), ContractError> {
    match source {
        SourceConfig::Rfc868(rfc868) => {
            if rfc868.host.trim().is_empty() {
                return Err(ContractError::config_validation(
                    "source.host",
                    "host cannot be empty",
                ));
            }
            if rfc868.port == 0 {
                return Err(ContractError::config_validation(
                    "source.port",
                    "port must be > 0",
                ));
            }
            if rfc868.connect_timeout_ms == 0 {
                return Err(ContractError::config_validation(
                    "source.connect_timeout_ms",
                    "connect_timeout_ms must be > 0",
                ));
            }
        }
        SourceConfig::Simulated(sim) => {
            if !sim.true_offset_s.is_finite() {
                return Err(ContractError::config_validation(
                    "source.true_offset_s",
                    format!("true_offset_s must be finite, got {}", sim.true_offset_s),
                ));
            }
            if !(0.0..=1.0).contains(&sim.failure_rate) {
                return Err(ContractError::config_validation(
                    "source.failure_rate",
                    format!(
                        "failure_rate must be within [0, 1], got {}",
                        sim.failure_rate
                    ),
                ));
            }
        }
    }
    Ok(())
}
