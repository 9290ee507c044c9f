use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app_config::env::env_or_default;

// 设置日志
// RUST_LOG 优先；否则 APP_ENV=LOCAL 输出 debug，其余环境输出 info。
// 全局 subscriber 只能设置一次，重复调用直接返回。
pub fn setup_logging() -> anyhow::Result<()> {
    let app_env = env_or_default("APP_ENV", "LOCAL");
    let default_level = if app_env == "LOCAL" { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(app_env == "LOCAL")
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("global tracing subscriber already set");
    }
    Ok(())
}
