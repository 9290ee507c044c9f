use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CalculatorError, Result};

/// Decimal 支持的最大小数位数
pub const MAX_SCALE: u32 = 28;

/// 舍入模式，语义与常见金融库一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMode {
    /// 远离零
    Up,
    /// 趋向零（截断）
    Down,
    /// 趋向正无穷
    Ceiling,
    /// 趋向负无穷
    Floor,
    /// 四舍五入，恰好一半时远离零
    HalfUp,
    /// 恰好一半时趋向零
    #[default]
    HalfDown,
    /// 银行家舍入
    HalfEven,
    /// 要求结果精确，不精确时报错
    Unnecessary,
}

impl RoundingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingMode::Up => "UP",
            RoundingMode::Down => "DOWN",
            RoundingMode::Ceiling => "CEILING",
            RoundingMode::Floor => "FLOOR",
            RoundingMode::HalfUp => "HALF_UP",
            RoundingMode::HalfDown => "HALF_DOWN",
            RoundingMode::HalfEven => "HALF_EVEN",
            RoundingMode::Unnecessary => "UNNECESSARY",
        }
    }

    /// 判断截断后的商是否需要在绝对值上进一
    fn increments(&self, negative: bool, odd: bool, fraction: Fraction) -> Result<bool> {
        if fraction == Fraction::Zero {
            return Ok(false);
        }
        let increment = match self {
            RoundingMode::Up => true,
            RoundingMode::Down => false,
            RoundingMode::Ceiling => !negative,
            RoundingMode::Floor => negative,
            RoundingMode::HalfUp => fraction >= Fraction::Half,
            RoundingMode::HalfDown => fraction == Fraction::AboveHalf,
            RoundingMode::HalfEven => {
                fraction == Fraction::AboveHalf || (fraction == Fraction::Half && odd)
            }
            RoundingMode::Unnecessary => return Err(CalculatorError::RoundingNecessary),
        };
        Ok(increment)
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingMode {
    type Err = CalculatorError;

    /// 支持 HALF_DOWN / half-down / HalfDown 等写法
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "UP" => Ok(RoundingMode::Up),
            "DOWN" => Ok(RoundingMode::Down),
            "CEILING" => Ok(RoundingMode::Ceiling),
            "FLOOR" => Ok(RoundingMode::Floor),
            "HALFUP" => Ok(RoundingMode::HalfUp),
            "HALFDOWN" => Ok(RoundingMode::HalfDown),
            "HALFEVEN" => Ok(RoundingMode::HalfEven),
            "UNNECESSARY" => Ok(RoundingMode::Unnecessary),
            _ => Err(CalculatorError::Config(format!(
                "unknown rounding mode: {}",
                s
            ))),
        }
    }
}

/// 余数相对于除数一半的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Fraction {
    Zero,
    BelowHalf,
    Half,
    AboveHalf,
}

impl Fraction {
    fn classify(remainder: u128, divisor: u128) -> Self {
        if remainder == 0 {
            return Fraction::Zero;
        }
        // remainder < divisor，比较 r 与 d - r 等价于比较 2r 与 d，且不会溢出
        match remainder.cmp(&(divisor - remainder)) {
            Ordering::Less => Fraction::BelowHalf,
            Ordering::Equal => Fraction::Half,
            Ordering::Greater => Fraction::AboveHalf,
        }
    }
}

/// 96 位尾数的最大值
const MAX_MANTISSA: u128 = (1 << 96) - 1;

/// 精确加法。
///
/// `Decimal::checked_add` 只在超出范围时返回 None，结果需要超过 28 位有效数字时会静默舍入；
/// 这里在 i128 尾数上直接相加，无法精确表示时返回错误。
pub fn exact_add(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    let lhs = lhs.normalize();
    let rhs = rhs.normalize();
    let scale = lhs.scale().max(rhs.scale());
    let sum = rescaled_mantissa(lhs, scale)?
        .checked_add(rescaled_mantissa(rhs, scale)?)
        .ok_or(CalculatorError::PrecisionExceeded)?;
    from_mantissa(sum, scale)
}

/// 精确减法，规则同 [`exact_add`]
pub fn exact_sub(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    exact_add(lhs, -rhs)
}

fn rescaled_mantissa(value: Decimal, scale: u32) -> Result<i128> {
    value
        .mantissa()
        .checked_mul(10i128.pow(scale - value.scale()))
        .ok_or(CalculatorError::PrecisionExceeded)
}

fn from_mantissa(mantissa: i128, scale: u32) -> Result<Decimal> {
    let (mut mantissa, mut scale) = (mantissa, scale);
    while scale > 0 && mantissa % 10 == 0 {
        mantissa /= 10;
        scale -= 1;
    }
    Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| {
        if mantissa.unsigned_abs() / 10u128.pow(scale) > MAX_MANTISSA {
            CalculatorError::Overflow
        } else {
            CalculatorError::PrecisionExceeded
        }
    })
}

/// 小数位数为 `scale` 的零
pub fn zero_with_scale(scale: u32) -> Result<Decimal> {
    Decimal::try_from_i128_with_scale(0, scale).map_err(|_| CalculatorError::InvalidScale(scale as i64))
}

/// 精确除法：`dividend / divisor`，结果保留 `scale` 位小数并按 `mode` 舍入。
///
/// 直接在尾数上做整数除法并保留精确余数，不经过 Decimal 自身 28 位有效数字的
/// 中间舍入，因此 CEILING / HALF_* 等模式在任何输入下都只舍入一次。
pub fn divide_scaled(
    dividend: Decimal,
    divisor: usize,
    scale: u32,
    mode: RoundingMode,
) -> Result<Decimal> {
    if scale > MAX_SCALE {
        return Err(CalculatorError::InvalidScale(scale as i64));
    }
    if divisor == 0 {
        return Err(CalculatorError::DivisionByZero);
    }

    let negative = dividend.is_sign_negative() && !dividend.is_zero();
    let magnitude = dividend.mantissa().unsigned_abs();
    let source_scale = dividend.scale();
    let divisor = divisor as u128;

    let (quotient, fraction) = if scale >= source_scale {
        let numerator = magnitude
            .checked_mul(10u128.pow(scale - source_scale))
            .ok_or(CalculatorError::Overflow)?;
        (
            numerator / divisor,
            Fraction::classify(numerator % divisor, divisor),
        )
    } else {
        match divisor.checked_mul(10u128.pow(source_scale - scale)) {
            Some(denominator) => (
                magnitude / denominator,
                Fraction::classify(magnitude % denominator, denominator),
            ),
            // 分母超过 u128 时必然远大于 96 位尾数
            None if magnitude == 0 => (0, Fraction::Zero),
            None => (0, Fraction::BelowHalf),
        }
    };

    let quotient = if mode.increments(negative, quotient % 2 == 1, fraction)? {
        quotient + 1
    } else {
        quotient
    };

    let signed = i128::try_from(quotient).map_err(|_| CalculatorError::Overflow)?;
    let signed = if negative { -signed } else { signed };
    Decimal::try_from_i128_with_scale(signed, scale).map_err(|_| CalculatorError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn div(value: &str, divisor: usize, scale: u32, mode: RoundingMode) -> String {
        divide_scaled(dec(value), divisor, scale, mode)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_exact_division_keeps_scale() {
        assert_eq!(div("15", 2, 5, RoundingMode::HalfDown), "7.50000");
        assert_eq!(div("15", 3, 0, RoundingMode::HalfDown), "5");
        assert_eq!(div("10.885", 2, 2, RoundingMode::HalfUp), "5.44");
    }

    #[test]
    fn test_half_modes_on_tie() {
        // 0.125 -> 两位小数恰好在中点
        assert_eq!(div("0.25", 2, 2, RoundingMode::HalfUp), "0.13");
        assert_eq!(div("0.25", 2, 2, RoundingMode::HalfDown), "0.12");
        assert_eq!(div("0.25", 2, 2, RoundingMode::HalfEven), "0.12");
        assert_eq!(div("0.35", 2, 2, RoundingMode::HalfEven), "0.18");
        assert_eq!(div("-0.25", 2, 2, RoundingMode::HalfUp), "-0.13");
        assert_eq!(div("-0.25", 2, 2, RoundingMode::HalfDown), "-0.12");
    }

    #[test]
    fn test_directed_modes() {
        // 1 / 3 = 0.333...
        assert_eq!(div("1", 3, 2, RoundingMode::Up), "0.34");
        assert_eq!(div("1", 3, 2, RoundingMode::Down), "0.33");
        assert_eq!(div("1", 3, 2, RoundingMode::Ceiling), "0.34");
        assert_eq!(div("1", 3, 2, RoundingMode::Floor), "0.33");
        assert_eq!(div("-1", 3, 2, RoundingMode::Ceiling), "-0.33");
        assert_eq!(div("-1", 3, 2, RoundingMode::Floor), "-0.34");
        assert_eq!(div("-1", 3, 2, RoundingMode::Up), "-0.34");
        assert_eq!(div("-1", 3, 2, RoundingMode::Down), "-0.33");
    }

    #[test]
    fn test_no_double_rounding() {
        // 商的非零部分位于第 28 位有效数字之后，CEILING 仍须进位
        let dividend = dec("0.0000000000000000000000000001");
        let result = divide_scaled(dividend, 7, 2, RoundingMode::Ceiling).unwrap();
        assert_eq!(result.to_string(), "0.01");
        let result = divide_scaled(dividend, 7, 2, RoundingMode::Floor).unwrap();
        assert_eq!(result.to_string(), "0.00");
    }

    #[test]
    fn test_unnecessary_only_when_exact() {
        assert_eq!(div("15", 3, 2, RoundingMode::Unnecessary), "5.00");
        assert_eq!(
            divide_scaled(dec("1"), 3, 2, RoundingMode::Unnecessary),
            Err(CalculatorError::RoundingNecessary)
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            divide_scaled(dec("1"), 0, 2, RoundingMode::HalfUp),
            Err(CalculatorError::DivisionByZero)
        );
        assert_eq!(
            divide_scaled(dec("1"), 1, 29, RoundingMode::HalfUp),
            Err(CalculatorError::InvalidScale(29))
        );
        assert_eq!(
            divide_scaled(Decimal::MAX, 1, 10, RoundingMode::HalfUp),
            Err(CalculatorError::Overflow)
        );
    }

    #[test]
    fn test_parse_rounding_mode() {
        assert_eq!("HALF_DOWN".parse::<RoundingMode>().unwrap(), RoundingMode::HalfDown);
        assert_eq!("half-even".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert_eq!("HalfUp".parse::<RoundingMode>().unwrap(), RoundingMode::HalfUp);
        assert_eq!(" ceiling ".parse::<RoundingMode>().unwrap(), RoundingMode::Ceiling);
        assert!("nearest".parse::<RoundingMode>().is_err());
        assert_eq!(RoundingMode::HalfEven.to_string(), "HALF_EVEN");
        assert_eq!(RoundingMode::default(), RoundingMode::HalfDown);
    }

    #[test]
    fn test_exact_add_rejects_silent_rounding() {
        let big = dec("100000000000000000000");
        let tiny = dec("0.0000000001");
        assert_eq!(exact_add(big, tiny), Err(CalculatorError::PrecisionExceeded));
        assert_eq!(exact_sub(big, tiny), Err(CalculatorError::PrecisionExceeded));
    }

    #[test]
    fn test_exact_add_mixed_magnitudes() {
        // 末尾的 0 不占用有效数字
        let one = dec("1.0000000000000000000000000000");
        let big = dec("100000000000000000000");
        assert_eq!(exact_add(big, one).unwrap(), dec("100000000000000000001"));
        assert_eq!(exact_sub(big, big).unwrap(), Decimal::ZERO);
        assert_eq!(exact_add(dec("0.5"), dec("0.50")).unwrap(), Decimal::ONE);
        assert_eq!(exact_add(dec("-1.25"), dec("0.0001")).unwrap(), dec("-1.2499"));
    }

    #[test]
    fn test_exact_add_overflow() {
        assert_eq!(exact_add(Decimal::MAX, Decimal::ONE), Err(CalculatorError::Overflow));
        assert_eq!(exact_sub(Decimal::MIN, Decimal::ONE), Err(CalculatorError::Overflow));
        assert_eq!(
            exact_add(Decimal::MAX, dec("0.1")),
            Err(CalculatorError::PrecisionExceeded)
        );
    }

    #[test]
    fn test_zero_with_scale() {
        assert_eq!(zero_with_scale(5).unwrap().to_string(), "0.00000");
        assert_eq!(zero_with_scale(0).unwrap().to_string(), "0");
    }
}
