pub mod calculator;
pub mod env;
pub mod log;
