//! 精确小数移动平均

pub mod moving_average;
pub mod rounding;

pub use moving_average::*;
pub use rounding::{RoundingMode, MAX_SCALE};

use rust_decimal::Decimal;

use crate::error::Result;

/// 移动平均计算器统一接口
pub trait MovingAverageCalculator {
    /// 追加一个值，同时更新窗口和窗口和
    fn insert(&mut self, value: Decimal) -> Result<()>;

    /// 当前窗口的移动平均；没有任何数据时返回按精度格式化的 0
    fn average(&self) -> Result<Decimal>;

    /// 已插入的元素总数
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool;

    /// 按插入顺序取第 `index` 个元素（从0开始）
    fn get(&self, index: i64) -> Result<Decimal>;

    /// 所有已插入元素的副本
    fn get_all(&self) -> Vec<Decimal>;
}
