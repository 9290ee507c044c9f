use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{CalculatorError, Result};

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) => v,
        Err(_) => default.to_string(),
    }
}

/// 读取并解析环境变量：不存在返回 None，解析失败返回配置错误
pub fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CalculatorError::Config(format!("{}={}: {}", key, v, e))),
        Err(_) => Ok(None),
    }
}
