use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalculatorError>;

/// 移动平均计算器错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    /// 窗口大小必须大于0
    #[error("Window size is invalid : {0}")]
    InvalidWindow(i64),

    /// 精度必须在 0..=28 之间
    #[error("Scale is invalid : {0}")]
    InvalidScale(i64),

    #[error("Rounding Mode is null")]
    RoundingModeMissing,

    #[error("Rounding Mode cant be UNNECESSARY")]
    RoundingModeUnnecessary,

    #[error("Index {index} out of range for size {size}")]
    IndexOutOfRange { index: i64, size: usize },

    /// 结果超出 Decimal 可表示范围
    #[error("Decimal overflow")]
    Overflow,

    /// 精确结果超过 Decimal 的 28 位有效数字，拒绝而不是静默舍入
    #[error("Decimal precision exceeded")]
    PrecisionExceeded,

    #[error("Division by zero")]
    DivisionByZero,

    /// UNNECESSARY 模式下除法结果不精确
    #[error("Rounding necessary")]
    RoundingNecessary,

    #[error("Config error: {0}")]
    Config(String),
}

impl CalculatorError {
    /// 是否属于参数非法类错误（窗口、精度、舍入模式）
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            CalculatorError::InvalidWindow(_)
                | CalculatorError::InvalidScale(_)
                | CalculatorError::RoundingModeMissing
                | CalculatorError::RoundingModeUnnecessary
        )
    }
}
