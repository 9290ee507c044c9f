pub mod calculator_error;

pub use calculator_error::{CalculatorError, Result};
