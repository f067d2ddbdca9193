use anyhow::{Context, Result};
use std::fs::OpenOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 未设置 RUST_LOG 时的默认过滤规则
const DEFAULT_FILTER: &str = "info";

/// 初始化日志：RUST_LOG 控制级别；设置了 LOG_FILE 时追加写入文件（不带颜色），否则输出到终端
pub fn init_logger() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match std::env::var("LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("打开日志文件失败: {}", path))?;
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file)
                        .with_ansi(false)
                        .with_target(false),
                )
                .try_init()
                .context("日志已初始化")?;
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("日志已初始化: {}", e))?;
        }
    }

    Ok(())
}
