//! 单个条目的状态机
//!
//! `Pending → InFlight → Succeeded | Failed`，
//! 可重试的失败在预算内回到 `Pending`，编号不变。

use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::clients::GenerationClient;
use crate::models::{GenerationOutcome, GenerationRequest};
use crate::orchestrator::policy::RunPolicy;

/// 取消时记录的失败原因
pub const CANCELLED_REASON: &str = "已取消";

/// 条目阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

/// 一次尝试结束后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 回到 Pending，等待退避后重试
    Retry,
    /// 进入终态
    Terminal,
}

/// 条目状态
#[derive(Debug, Clone)]
pub struct ItemSlot {
    pub index: usize,
    pub phase: ItemPhase,
    pub retries_used: u32,
    max_retries: u32,
}

impl ItemSlot {
    pub fn new(index: usize, max_retries: u32) -> Self {
        Self {
            index,
            phase: ItemPhase::Pending,
            retries_used: 0,
            max_retries,
        }
    }

    pub fn start(&mut self) {
        debug_assert_eq!(self.phase, ItemPhase::Pending);
        self.phase = ItemPhase::InFlight;
    }

    /// 根据尝试结果推进状态
    pub fn resolve(&mut self, outcome: &GenerationOutcome) -> Transition {
        debug_assert_eq!(self.phase, ItemPhase::InFlight);
        match outcome {
            GenerationOutcome::Success { .. } => {
                self.phase = ItemPhase::Succeeded;
                Transition::Terminal
            }
            GenerationOutcome::Failure {
                is_transient: true,
                ..
            } if self.retries_used < self.max_retries => {
                self.retries_used += 1;
                self.phase = ItemPhase::Pending;
                Transition::Retry
            }
            GenerationOutcome::Failure { .. } => {
                self.phase = ItemPhase::Failed;
                Transition::Terminal
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, ItemPhase::Succeeded | ItemPhase::Failed)
    }
}

/// 条目的终态结果
#[derive(Debug, Clone)]
pub struct ItemResolution {
    pub index: usize,
    pub outcome: GenerationOutcome,
    /// 实际发出的请求次数
    pub attempts: usize,
}

impl ItemResolution {
    pub fn cancelled(index: usize) -> Self {
        Self {
            index,
            outcome: GenerationOutcome::permanent(CANCELLED_REASON),
            attempts: 0,
        }
    }
}

pub fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.map(|rx| *rx.borrow()).unwrap_or(false)
}

/// 驱动一个条目直到终态（包含重试和退避）
pub async fn drive_item<C: GenerationClient + ?Sized>(
    client: &C,
    index: usize,
    request: &GenerationRequest,
    policy: &RunPolicy,
    cancel: Option<&watch::Receiver<bool>>,
) -> ItemResolution {
    let mut slot = ItemSlot::new(index, policy.retry.max_retries);
    let mut attempts = 0;

    loop {
        slot.start();
        attempts += 1;
        debug!("[第 {} 篇] 第 {} 次尝试", index + 1, attempts);

        let outcome = client.generate(request, policy.request_timeout).await;

        match slot.resolve(&outcome) {
            Transition::Terminal => {
                return ItemResolution {
                    index,
                    outcome,
                    attempts,
                };
            }
            Transition::Retry => {
                warn!(
                    "[第 {} 篇] 暂时性失败 (重试 {}/{}): {}，等待 {} 秒后重试...",
                    index + 1,
                    slot.retries_used,
                    policy.retry.max_retries,
                    outcome.failure_reason().unwrap_or_default(),
                    policy.retry.backoff.as_secs()
                );
                sleep_unless_zero(policy.retry.backoff).await;

                if is_cancelled(cancel) {
                    return ItemResolution {
                        index,
                        outcome: GenerationOutcome::permanent(CANCELLED_REASON),
                        attempts,
                    };
                }
            }
        }
    }
}

pub async fn sleep_unless_zero(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
