//! 引擎配置

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::time::SimTime;

/// 事件存储的分桶参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 单个桶覆盖的时长（纳秒）
    pub bucket_width: SimTime,
    /// 近未来桶的数量，超出部分进入溢出集合
    pub max_buckets: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bucket_width: SimTime::from_millis(1),
            max_buckets: 128,
        }
    }
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_width == SimTime::ZERO {
            return Err(ConfigError::ZeroBucketWidth);
        }
        if self.max_buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        Ok(())
    }
}
