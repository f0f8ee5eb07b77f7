//! 引擎与配置错误

use std::io;

use thiserror::Error;

/// 引擎配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bucket width must be positive")]
    ZeroBucketWidth,
    #[error("bucket count must be positive")]
    ZeroBuckets,
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 运行期错误（仅限启动/停机；稳态下的丢包从不是错误）
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("network is already running or has been consumed")]
    AlreadyStarted,
    #[error("network was never started")]
    NotStarted,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("engine thread panicked")]
    Panicked,
}
