//! # Decimal Moving Average
//!
//! 基于 `rust_decimal` 的精确移动平均：全部历史只增不减，窗口和 O(1) 增量维护，
//! 只在输出平均值时按指定精度和舍入模式舍入一次。

pub mod app_config;
pub mod error;
pub mod indicator;

pub use error::{CalculatorError, Result};
pub use indicator::{DecimalMovingAverage, MovingAverageCalculator, RoundingMode};
