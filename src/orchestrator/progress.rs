//! 进度汇报
//!
//! 每个条目进入终态时调用一次 `on_attempt_resolved`；
//! 还会重试的失败尝试不会经过这里。
//! 界面通过 `subscribe()` 拿到只读的 `watch::Receiver` 轮询快照。

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::GenerationOutcome;

/// 进度状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub total: usize,
    /// 已进入终态的条目数（成功 + 失败）
    pub completed: usize,
    pub failed: usize,
    /// 失败信息，带 1 起始的条目编号
    pub error_messages: Vec<String>,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }

    /// 面向用户的状态文本
    pub fn summary_message(&self) -> String {
        if !self.is_finished() {
            return format!("生成中 {}/{}", self.completed, self.total);
        }
        if self.failed == 0 {
            format!("{}/{} 篇生成成功", self.total, self.total)
        } else if self.failed < self.total {
            format!(
                "{}/{} 篇生成成功，{} 篇失败（详见错误信息）",
                self.succeeded(),
                self.total,
                self.failed
            )
        } else {
            format!("生成失败：全部 {} 篇均失败", self.total)
        }
    }
}

/// 条目失败信息的统一格式
pub fn item_error_message(index: usize, reason: &str) -> String {
    format!("[第 {} 篇] {}", index + 1, reason)
}

/// 进度汇报器
#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<ProgressState>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::default());
        Self { tx }
    }

    /// 开始新一轮编排，旧状态被丢弃
    pub fn reset(&mut self, total: usize) {
        self.tx.send_replace(ProgressState::new(total));
    }

    /// 记录一个条目的终态结果
    ///
    /// 计数的读改写在同一个同步闭包内完成。
    pub fn on_attempt_resolved(&mut self, index: usize, outcome: &GenerationOutcome) {
        self.tx.send_modify(|state| {
            state.completed += 1;
            if let GenerationOutcome::Failure { reason, .. } = outcome {
                state.failed += 1;
                state.error_messages.push(item_error_message(index, reason));
            }
        });
    }

    pub fn snapshot(&self) -> ProgressState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
