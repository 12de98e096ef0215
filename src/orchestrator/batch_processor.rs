//! 批量生成编排器
//!
//! ## 职责
//!
//! 把 N 个生成请求全部驱动到终态，期间：
//!
//! 1. **节奏控制**：串行（一次一个，条目间等待）或小批量并发（整批结束后再开始下一批）
//! 2. **重试**：可重试的失败在同一编号上重试，不占用新的编号
//! 3. **进度**：每个条目进入终态时更新一次进度
//! 4. **汇总**：按提交顺序收集成功结果
//!
//! 单个条目的失败不会中断整个编排；只有全部失败时才返回错误。
//!
//! 批内并发是同一个任务内的交错执行（`FuturesUnordered`），不会启动新线程，
//! 进度的读改写在两个 `.await` 之间同步完成。

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;
use tracing::{error, info};

use crate::clients::GenerationClient;
use crate::error::{OrchestrationResult, OrchestrationError};
use crate::models::{GenerationOutcome, GenerationRequest};
use crate::orchestrator::aggregator::{self, ResultSet};
use crate::orchestrator::item::{self, drive_item, sleep_unless_zero, ItemResolution};
use crate::orchestrator::policy::{Pacing, RunPolicy};
use crate::orchestrator::progress::{ProgressReporter, ProgressState};

/// 编排结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    AllSucceeded,
    /// 部分成功，附带失败数量
    PartialSuccess { failed: usize },
}

/// 一次编排的报告
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result_set: ResultSet,
    pub progress: ProgressState,
    /// 实际发出的请求总数（含重试）
    pub attempts: usize,
    pub status: RunStatus,
}

/// 批量生成编排器
pub struct Orchestrator<C> {
    client: C,
    reporter: ProgressReporter,
}

impl<C: GenerationClient> Orchestrator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            reporter: ProgressReporter::new(),
        }
    }

    /// 订阅进度（只读）
    pub fn progress(&self) -> watch::Receiver<ProgressState> {
        self.reporter.subscribe()
    }

    pub fn progress_snapshot(&self) -> ProgressState {
        self.reporter.snapshot()
    }

    /// 生成 `count` 篇
    ///
    /// `request_factory` 在任何请求发出前为每个编号调用一次。
    pub async fn run<F>(
        &mut self,
        count: usize,
        request_factory: F,
        policy: &RunPolicy,
    ) -> OrchestrationResult<RunReport>
    where
        F: FnMut(usize) -> GenerationRequest,
    {
        self.run_inner(count, request_factory, policy, None).await
    }

    /// 同 `run`，但 `cancel` 变为 `true` 后不再发出新的请求或重试，
    /// 尚未开始的条目记为失败
    pub async fn run_with_cancel<F>(
        &mut self,
        count: usize,
        request_factory: F,
        policy: &RunPolicy,
        cancel: watch::Receiver<bool>,
    ) -> OrchestrationResult<RunReport>
    where
        F: FnMut(usize) -> GenerationRequest,
    {
        self.run_inner(count, request_factory, policy, Some(&cancel))
            .await
    }

    async fn run_inner<F>(
        &mut self,
        count: usize,
        request_factory: F,
        policy: &RunPolicy,
        cancel: Option<&watch::Receiver<bool>>,
    ) -> OrchestrationResult<RunReport>
    where
        F: FnMut(usize) -> GenerationRequest,
    {
        if count == 0 {
            return Err(OrchestrationError::InvalidCount);
        }

        let requests: Vec<GenerationRequest> = (0..count).map(request_factory).collect();
        self.reporter.reset(count);
        log_run_start(count, policy);

        let (outcomes, attempts) = match policy.pacing {
            Pacing::Sequential {
                success_delay,
                failure_delay,
            } => {
                self.run_sequential(&requests, policy, success_delay, failure_delay, cancel)
                    .await
            }
            Pacing::Batched {
                batch_size,
                batch_delay,
            } => {
                self.run_batched(&requests, policy, batch_size.max(1), batch_delay, cancel)
                    .await
            }
        };

        let progress = self.reporter.snapshot();
        log_run_complete(&progress, attempts);

        if progress.failed == count {
            error!("❌ {}", progress.summary_message());
            return Err(OrchestrationError::AllFailed {
                total: count,
                errors: progress.error_messages,
            });
        }

        let status = if progress.failed == 0 {
            RunStatus::AllSucceeded
        } else {
            RunStatus::PartialSuccess {
                failed: progress.failed,
            }
        };

        Ok(RunReport {
            result_set: aggregator::finalize(outcomes),
            progress,
            attempts,
            status,
        })
    }

    /// 串行：上一个条目进入终态后才开始下一个
    async fn run_sequential(
        &mut self,
        requests: &[GenerationRequest],
        policy: &RunPolicy,
        success_delay: std::time::Duration,
        failure_delay: std::time::Duration,
        cancel: Option<&watch::Receiver<bool>>,
    ) -> (Vec<(usize, GenerationOutcome)>, usize) {
        let total = requests.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut attempts = 0;

        for (index, request) in requests.iter().enumerate() {
            let resolution = if item::is_cancelled(cancel) {
                ItemResolution::cancelled(index)
            } else {
                info!("📝 [第 {}/{} 篇] 开始生成", index + 1, total);
                drive_item(&self.client, index, request, policy, cancel).await
            };

            let succeeded = resolution.outcome.is_success();
            attempts += resolution.attempts;
            self.record(&resolution);
            outcomes.push((index, resolution.outcome));

            if index + 1 < total && !item::is_cancelled(cancel) {
                sleep_unless_zero(if succeeded {
                    success_delay
                } else {
                    failure_delay
                })
                .await;
            }
        }

        (outcomes, attempts)
    }

    /// 小批量并发：一批全部进入终态后才开始下一批
    async fn run_batched(
        &mut self,
        requests: &[GenerationRequest],
        policy: &RunPolicy,
        batch_size: usize,
        batch_delay: std::time::Duration,
        cancel: Option<&watch::Receiver<bool>>,
    ) -> (Vec<(usize, GenerationOutcome)>, usize) {
        let total = requests.len();
        let total_batches = total.div_ceil(batch_size);
        let mut outcomes = Vec::with_capacity(total);
        let mut attempts = 0;

        for batch_start in (0..total).step_by(batch_size) {
            let batch_end = (batch_start + batch_size).min(total);
            let batch_num = batch_start / batch_size + 1;

            if item::is_cancelled(cancel) {
                for index in batch_start..batch_end {
                    let resolution = ItemResolution::cancelled(index);
                    self.record(&resolution);
                    outcomes.push((index, resolution.outcome));
                }
                continue;
            }

            log_batch_start(batch_num, total_batches, batch_start + 1, batch_end, total);

            let client = &self.client;
            let mut in_flight: FuturesUnordered<_> = (batch_start..batch_end)
                .map(move |index| drive_item(client, index, &requests[index], policy, cancel))
                .collect();

            let mut batch_success = 0;
            while let Some(resolution) = in_flight.next().await {
                if resolution.outcome.is_success() {
                    batch_success += 1;
                }
                attempts += resolution.attempts;
                self.reporter.on_attempt_resolved(resolution.index, &resolution.outcome);
                log_item_resolved(&resolution);
                outcomes.push((resolution.index, resolution.outcome));
            }
            drop(in_flight);

            log_batch_complete(batch_num, batch_success, batch_end - batch_start);

            if batch_end < total && !item::is_cancelled(cancel) {
                sleep_unless_zero(batch_delay).await;
            }
        }

        (outcomes, attempts)
    }

    fn record(&mut self, resolution: &ItemResolution) {
        self.reporter
            .on_attempt_resolved(resolution.index, &resolution.outcome);
        log_item_resolved(resolution);
    }
}

// ========== 日志辅助函数 ==========

fn log_run_start(count: usize, policy: &RunPolicy) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始批量生成，共 {} 篇", count);
    match policy.pacing {
        Pacing::Sequential {
            success_delay,
            failure_delay,
        } => info!(
            "📋 串行模式：成功后等待 {} 秒，失败后等待 {} 秒",
            success_delay.as_secs(),
            failure_delay.as_secs()
        ),
        Pacing::Batched {
            batch_size,
            batch_delay,
        } => info!(
            "📋 批量模式：每批 {} 篇，批间等待 {} 秒",
            batch_size,
            batch_delay.as_secs()
        ),
    }
    info!(
        "🔁 最多重试 {} 次，间隔 {} 秒",
        policy.retry.max_retries,
        policy.retry.backoff.as_secs()
    );
    info!("{}", "=".repeat(60));
}

fn log_item_resolved(resolution: &ItemResolution) {
    match &resolution.outcome {
        GenerationOutcome::Success { payload } => info!(
            "[第 {} 篇] ✓ 生成成功: {} (尝试 {} 次)",
            resolution.index + 1,
            payload.title,
            resolution.attempts
        ),
        GenerationOutcome::Failure { reason, .. } => error!(
            "[第 {} 篇] ❌ 生成失败: {} (尝试 {} 次)",
            resolution.index + 1,
            reason,
            resolution.attempts
        ),
    }
}

fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批: 第 {}-{} 篇 / 共 {} 篇", start, end, total);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch_num: usize, success: usize, size: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, size);
    info!("{}", "─".repeat(60));
}

fn log_run_complete(progress: &ProgressState, attempts: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批量生成完成统计");
    info!("✅ 成功: {}/{}", progress.succeeded(), progress.total);
    info!("❌ 失败: {}", progress.failed);
    info!("📨 请求总数: {}", attempts);
    info!("{}", "=".repeat(60));
}
