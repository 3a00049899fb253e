pub mod cli;
pub mod config;
pub mod core;
pub mod query;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 默认级别取自 `RUST_LOG`，未设置时为 `info`；`verbose` 为 true 时强制 `debug`
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;
    Ok(())
}
