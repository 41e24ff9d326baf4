//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// - `RUST_LOG` 未设置时默认 `info`
/// - 通过 `tracing-log` 转发 `log` 记录
/// - 可重复调用，只有第一次生效
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        let _ = tracing_log::LogTracer::init();
    }
}
