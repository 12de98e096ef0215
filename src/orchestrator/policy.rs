//! 节奏与重试策略

use std::time::Duration;

use crate::config::Config;
use crate::models::PacingKind;

/// 节奏策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// 串行：同一时间只有一个请求，成功/失败后分别等待
    Sequential {
        success_delay: Duration,
        failure_delay: Duration,
    },
    /// 小批量并发：每批同时发出，整批结束后等待再开始下一批
    Batched {
        batch_size: usize,
        batch_delay: Duration,
    },
}

impl Pacing {
    pub fn sequential() -> Self {
        Pacing::Sequential {
            success_delay: Duration::from_secs(2),
            failure_delay: Duration::from_secs(3),
        }
    }

    pub fn batched() -> Self {
        Pacing::Batched {
            batch_size: 3,
            batch_delay: Duration::from_secs(1),
        }
    }
}

/// 重试策略（固定间隔）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 每个条目最多重试次数（不含首次尝试）
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(5),
        }
    }
}

/// 一次编排的完整策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    pub pacing: Pacing,
    pub retry: RetryPolicy,
    /// 单次请求超时
    pub request_timeout: Duration,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            pacing: Pacing::sequential(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl RunPolicy {
    /// 按配置和任务指定的节奏类型构建策略
    pub fn from_config(config: &Config, kind: PacingKind) -> Self {
        let pacing = match kind {
            PacingKind::Sequential => Pacing::Sequential {
                success_delay: Duration::from_secs(config.success_delay_secs),
                failure_delay: Duration::from_secs(config.failure_delay_secs),
            },
            PacingKind::Batched => Pacing::Batched {
                batch_size: config.batch_size.max(1),
                batch_delay: Duration::from_secs(config.batch_delay_secs),
            },
        };

        Self {
            pacing,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: Duration::from_secs(config.retry_backoff_secs),
            },
            request_timeout: config.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_batched() {
        let config = Config {
            batch_size: 5,
            batch_delay_secs: 4,
            max_retries: 1,
            ..Config::default()
        };
        let policy = RunPolicy::from_config(&config, PacingKind::Batched);
        assert_eq!(
            policy.pacing,
            Pacing::Batched {
                batch_size: 5,
                batch_delay: Duration::from_secs(4)
            }
        );
        assert_eq!(policy.retry.max_retries, 1);
        assert_eq!(policy.retry.backoff, Duration::from_secs(5));
    }

    #[test]
    fn test_from_config_sequential_uses_default_delays() {
        let policy = RunPolicy::from_config(&Config::default(), PacingKind::Sequential);
        assert_eq!(policy.pacing, Pacing::sequential());
        assert_eq!(policy, RunPolicy::default());
    }
}
