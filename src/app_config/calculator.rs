use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app_config::env::env_parse;
use crate::error::{CalculatorError, Result};
use crate::indicator::moving_average::{DEFAULT_ROUNDING_MODE, DEFAULT_SCALE};
use crate::indicator::RoundingMode;

pub const MA_WINDOW: &str = "MA_WINDOW";
pub const MA_SCALE: &str = "MA_SCALE";
pub const MA_ROUNDING_MODE: &str = "MA_ROUNDING_MODE";

/// 计算器参数。
///
/// 这里只负责承载和读取，取值是否合法由 `DecimalMovingAverage::from_config` 校验；
/// `rounding_mode` 为 `None`（JSON 中的 null）时创建会失败。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    pub window: i64,
    #[serde(default = "default_scale")]
    pub scale: i64,
    #[serde(default = "default_rounding_mode")]
    pub rounding_mode: Option<RoundingMode>,
}

fn default_scale() -> i64 {
    DEFAULT_SCALE as i64
}

fn default_rounding_mode() -> Option<RoundingMode> {
    Some(DEFAULT_ROUNDING_MODE)
}

impl CalculatorConfig {
    pub fn new(window: i64) -> Self {
        Self {
            window,
            scale: default_scale(),
            rounding_mode: default_rounding_mode(),
        }
    }

    /// 从环境变量（及 .env）读取：MA_WINDOW 必填，MA_SCALE / MA_ROUNDING_MODE 可选
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let window = env_parse::<i64>(MA_WINDOW)?
            .ok_or_else(|| CalculatorError::Config(format!("{} is not set", MA_WINDOW)))?;
        let scale = env_parse::<i64>(MA_SCALE)?.unwrap_or_else(default_scale);
        let rounding_mode = env_parse::<RoundingMode>(MA_ROUNDING_MODE)?
            .or_else(default_rounding_mode);

        let config = Self {
            window,
            scale,
            rounding_mode,
        };
        info!(?config, "加载移动平均配置");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: CalculatorConfig = serde_json::from_str(r#"{"window": 20}"#).unwrap();
        assert_eq!(config, CalculatorConfig::new(20));
        assert_eq!(config.scale, 5);
        assert_eq!(config.rounding_mode, Some(RoundingMode::HalfDown));
    }

    #[test]
    fn test_deserialize_explicit_values() {
        let config: CalculatorConfig = serde_json::from_str(
            r#"{"window": 3, "scale": 2, "rounding_mode": "HALF_EVEN"}"#,
        )
        .unwrap();
        assert_eq!(config.window, 3);
        assert_eq!(config.scale, 2);
        assert_eq!(config.rounding_mode, Some(RoundingMode::HalfEven));

        let config: CalculatorConfig =
            serde_json::from_str(r#"{"window": 3, "rounding_mode": null}"#).unwrap();
        assert_eq!(config.rounding_mode, None);
    }

    #[test]
    fn test_window_is_required() {
        assert!(serde_json::from_str::<CalculatorConfig>(r#"{"scale": 2}"#).is_err());
    }
}
