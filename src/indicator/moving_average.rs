use std::collections::VecDeque;
use std::fmt;

use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use crate::app_config::calculator::CalculatorConfig;
use crate::error::{CalculatorError, Result};
use crate::indicator::rounding::{self, RoundingMode, MAX_SCALE};
use crate::indicator::MovingAverageCalculator;

/// 默认保留5位小数
pub const DEFAULT_SCALE: u32 = 5;

/// 默认舍入模式
pub const DEFAULT_ROUNDING_MODE: RoundingMode = RoundingMode::HalfDown;

/// 基于 Decimal 的滑动窗口移动平均。
///
/// - `values` 保存全部历史数据，只增不减
/// - `window_values` 只保存最近 `min(window, values.len())` 个值
/// - `window_sum` 为窗口内元素的精确和，插入时 O(1) 增量维护
///
/// 不做内部同步，多线程共享时由调用方整体加锁（例如 `Mutex<DecimalMovingAverage>`）。
#[derive(Debug, Clone)]
pub struct DecimalMovingAverage {
    values: Vec<Decimal>,
    window: usize,
    window_values: VecDeque<Decimal>,
    window_sum: Decimal,
    scale: u32,
    rounding_mode: RoundingMode,
}

impl DecimalMovingAverage {
    pub fn new(window: i64) -> Result<Self> {
        Self::with_scale_and_rounding(window, DEFAULT_SCALE as i64, DEFAULT_ROUNDING_MODE)
    }

    pub fn with_scale(window: i64, scale: i64) -> Result<Self> {
        Self::with_scale_and_rounding(window, scale, DEFAULT_ROUNDING_MODE)
    }

    pub fn with_rounding_mode(
        window: i64,
        rounding_mode: impl Into<Option<RoundingMode>>,
    ) -> Result<Self> {
        Self::with_scale_and_rounding(window, DEFAULT_SCALE as i64, rounding_mode)
    }

    pub fn with_scale_and_rounding(
        window: i64,
        scale: i64,
        rounding_mode: impl Into<Option<RoundingMode>>,
    ) -> Result<Self> {
        let window = validate_window(window)?;
        let scale = validate_scale(scale)?;
        let rounding_mode = validate_rounding_mode(rounding_mode.into())?;

        debug!(window, scale, %rounding_mode, "创建移动平均计算器");
        Ok(Self {
            values: Vec::new(),
            window,
            window_values: VecDeque::new(),
            window_sum: Decimal::ZERO,
            scale,
            rounding_mode,
        })
    }

    /// 由配置创建，配置中的各项同样要通过校验
    pub fn from_config(config: &CalculatorConfig) -> Result<Self> {
        Self::with_scale_and_rounding(config.window, config.scale, config.rounding_mode)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// 修改窗口大小，并用全部历史中最近的 `window` 个值重建窗口和窗口和。
    ///
    /// 校验和求和都在修改状态之前完成，失败时原状态不变。
    pub fn set_window(&mut self, window: i64) -> Result<()> {
        let window = validate_window(window)?;

        let start = self.values.len().saturating_sub(window);
        let tail = &self.values[start..];
        let window_sum = tail
            .iter()
            .try_fold(Decimal::ZERO, |acc, value| rounding::exact_add(acc, *value))?;

        self.window = window;
        self.window_values.clear();
        self.window_values.extend(tail.iter().copied());
        self.window_sum = window_sum;

        debug!(
            window,
            window_len = self.window_values.len(),
            window_sum = %self.window_sum,
            "窗口大小已更新并重新计算"
        );
        Ok(())
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// 只影响之后的 `average()` 结果，不改变已存储的数据
    pub fn set_scale(&mut self, scale: i64) -> Result<()> {
        self.scale = validate_scale(scale)?;
        debug!(scale = self.scale, "精度已更新");
        Ok(())
    }

    pub fn rounding_mode(&self) -> RoundingMode {
        self.rounding_mode
    }

    pub fn set_rounding_mode(
        &mut self,
        rounding_mode: impl Into<Option<RoundingMode>>,
    ) -> Result<()> {
        self.rounding_mode = validate_rounding_mode(rounding_mode.into())?;
        debug!(rounding_mode = %self.rounding_mode, "舍入模式已更新");
        Ok(())
    }
}

impl MovingAverageCalculator for DecimalMovingAverage {
    fn insert(&mut self, value: Decimal) -> Result<()> {
        // 窗口已满时先移出最旧的值
        let evicted = if self.window_values.len() >= self.window {
            self.window_values.front().copied()
        } else {
            None
        };

        // 新的窗口和先算好，无法精确表示时直接返回，状态保持不变
        let mut window_sum = self.window_sum;
        if let Some(oldest) = evicted {
            window_sum = rounding::exact_sub(window_sum, oldest)?;
        }
        let window_sum = rounding::exact_add(window_sum, value)?;

        if evicted.is_some() {
            self.window_values.pop_front();
        }
        self.values.push(value);
        self.window_values.push_back(value);
        self.window_sum = window_sum;

        trace!(%value, window_sum = %self.window_sum, size = self.values.len(), "insert");
        Ok(())
    }

    fn average(&self) -> Result<Decimal> {
        if self.values.is_empty() {
            return rounding::zero_with_scale(self.scale);
        }
        // 数据不足一个窗口时按实际数量求平均
        let count = self.window_values.len();
        rounding::divide_scaled(self.window_sum, count, self.scale, self.rounding_mode)
    }

    fn size(&self) -> usize {
        self.values.len()
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, index: i64) -> Result<Decimal> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i))
            .copied()
            .ok_or(CalculatorError::IndexOutOfRange {
                index,
                size: self.values.len(),
            })
    }

    fn get_all(&self) -> Vec<Decimal> {
        self.values.clone()
    }
}

impl fmt::Display for DecimalMovingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MA({}, {} {}): ", self.window, self.scale, self.rounding_mode)?;
        match self.average() {
            Ok(average) => write!(f, "{}", average),
            Err(e) => write!(f, "{}", e),
        }
    }
}

fn validate_window(window: i64) -> Result<usize> {
    if window <= 0 {
        warn!(window, "非法的窗口大小");
        return Err(CalculatorError::InvalidWindow(window));
    }
    usize::try_from(window).map_err(|_| CalculatorError::InvalidWindow(window))
}

fn validate_scale(scale: i64) -> Result<u32> {
    match u32::try_from(scale) {
        Ok(scale) if scale <= MAX_SCALE => Ok(scale),
        _ => {
            warn!(scale, "非法的精度");
            Err(CalculatorError::InvalidScale(scale))
        }
    }
}

fn validate_rounding_mode(rounding_mode: Option<RoundingMode>) -> Result<RoundingMode> {
    match rounding_mode {
        None => {
            warn!("舍入模式为空");
            Err(CalculatorError::RoundingModeMissing)
        }
        Some(RoundingMode::Unnecessary) => {
            warn!("舍入模式不能为 UNNECESSARY");
            Err(CalculatorError::RoundingModeUnnecessary)
        }
        Some(mode) => Ok(mode),
    }
}
