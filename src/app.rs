use crate::clients::{self, GenerationClient};
use crate::config::{ClientKind, Config};
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::models::{load_all_jobs, GenerationJob, Provider};
use crate::orchestrator::{Orchestrator, ProgressState, RunPolicy, RunReport, RunStatus};
use crate::services::{DraftAutosaver, DraftStore, FileDraftStore};
use crate::utils::logging;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

type JobAutosaver = DraftAutosaver<Arc<dyn DraftStore>, JobDraft>;

/// 应用主结构
pub struct App {
    config: Config,
    client: Arc<dyn GenerationClient>,
    drafts: Arc<dyn DraftStore>,
}

/// 任务草稿
///
/// 任务开始前写入，运行中随进度防抖更新，至少生成一篇后清除。
/// 下次启动时，任务目录里已经没有的草稿任务会被重新执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDraft {
    pub job: GenerationJob,
    /// 最近一次保存时的进度
    pub progress: ProgressState,
}

/// 任务统计
#[derive(Debug, Default)]
struct JobStats {
    success: usize,
    failed: usize,
    total: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let client = clients::from_config(&config)?;
        Ok(Self::with_client(config, client))
    }

    /// 使用指定的生成客户端初始化，草稿保存在 `draft_folder`
    pub fn with_client(config: Config, client: Arc<dyn GenerationClient>) -> Self {
        let drafts = Arc::new(FileDraftStore::new(&config.draft_folder));
        Self::with_parts(config, client, drafts)
    }

    /// 使用指定的生成客户端和草稿存储初始化
    pub fn with_parts(
        config: Config,
        client: Arc<dyn GenerationClient>,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        let client_name = match config.client_kind {
            ClientKind::Http => "后端 API",
            ClientKind::Llm => "LLM 直连",
        };
        logging::log_startup(client_name, config.batch_size, config.max_retries);

        Self {
            config,
            client,
            drafts,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        info!("\n📁 正在扫描待处理的生成任务...");
        let mut jobs = load_all_jobs(&self.config.job_folder)
            .await
            .with_context(|| format!("无法加载任务目录: {}", self.config.job_folder))?;
        let recovered = self.recover_drafts(&jobs).await?;
        jobs.extend(recovered);

        if jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的任务文件，程序结束");
            return Ok(());
        }

        logging::log_jobs_loaded(jobs.len());

        let mut stats = JobStats {
            total: jobs.len(),
            ..Default::default()
        };

        for job in &jobs {
            match self.process_job(job).await {
                Ok(true) => stats.success += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    error!("[任务 {}] ❌ 处理过程中发生错误: {:#}", job.name, e);
                    stats.failed += 1;
                }
            }
        }

        logging::print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );

        Ok(())
    }

    /// 读取上次遗留的草稿，返回任务目录中已不存在的任务
    async fn recover_drafts(&self, jobs: &[GenerationJob]) -> Result<Vec<GenerationJob>> {
        let keys = self.drafts.keys().await.context("无法读取草稿目录")?;

        let mut recovered = Vec::new();
        for key in keys {
            let Some(draft) = self.autosaver(&key).load_on_mount().await? else {
                continue;
            };

            if jobs.iter().any(|job| job.name == draft.job.name) {
                info!(
                    "[任务 {}] 上次运行未成功（{}），将按任务文件重新生成",
                    draft.job.name,
                    draft.progress.summary_message()
                );
                continue;
            }

            info!(
                "♻️ 恢复未完成的任务: {}（上次进度: {}）",
                draft.job.name,
                draft.progress.summary_message()
            );
            recovered.push(draft.job);
        }

        Ok(recovered)
    }

    /// 处理单个任务，返回是否至少生成了一篇
    pub async fn process_job(&self, job: &GenerationJob) -> Result<bool> {
        let target = match job.validate() {
            Ok(target) => target,
            Err(e) => {
                error!("[任务 {}] ❌ 任务无效: {}", job.name, e);
                return Ok(false);
            }
        };

        info!(
            "[任务 {}] 开始处理: {} 篇，模型 {}，原文: {}",
            job.name,
            job.count,
            target,
            logging::truncate_text(job.source_text.trim(), 40)
        );

        // 第一个请求发出前落盘
        let mut autosaver = self.autosaver(&job.name);
        autosaver.on_change(JobDraft {
            job: job.clone(),
            progress: ProgressState::new(job.count),
        });
        autosaver.flush().await?;

        let policy = RunPolicy::from_config(&self.config, job.pacing);
        let mut orchestrator = Orchestrator::new(self.client.clone());

        let result = self
            .run_with_autosave(&mut orchestrator, job, target, &policy, &mut autosaver)
            .await;

        match result {
            Ok(report) => {
                let path = self.write_results(job, &report).await?;
                autosaver.clear_on_success().await?;
                log_job_complete(job, &report, &path);
                Ok(true)
            }
            Err(OrchestrationError::AllFailed { total, errors }) => {
                autosaver.on_change(JobDraft {
                    job: job.clone(),
                    progress: orchestrator.progress_snapshot(),
                });
                autosaver.flush().await?;

                error!("[任务 {}] ❌ 生成失败：全部 {} 篇均失败", job.name, total);
                for message in &errors {
                    error!("[任务 {}]    {}", job.name, message);
                }
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 运行编排，同时把进度变化防抖写入草稿
    async fn run_with_autosave(
        &self,
        orchestrator: &mut Orchestrator<Arc<dyn GenerationClient>>,
        job: &GenerationJob,
        target: Provider,
        policy: &RunPolicy,
        autosaver: &mut JobAutosaver,
    ) -> OrchestrationResult<RunReport> {
        let debounce = Duration::from_millis(self.config.draft_debounce_ms);
        let mut progress = orchestrator.progress();

        let run = orchestrator.run(job.count, |_| job.request(target), policy);
        tokio::pin!(run);

        loop {
            tokio::select! {
                result = &mut run => return result,
                Ok(()) = progress.changed() => {
                    let snapshot = progress.borrow_and_update().clone();
                    autosaver.on_change(JobDraft {
                        job: job.clone(),
                        progress: snapshot,
                    });
                }
                _ = tokio::time::sleep(debounce), if autosaver.has_pending() => {
                    if let Err(e) = autosaver.tick().await {
                        warn!("[任务 {}] ⚠️ 草稿保存失败: {}", job.name, e);
                    }
                }
            }
        }
    }

    fn autosaver(&self, key: &str) -> JobAutosaver {
        DraftAutosaver::new(
            self.drafts.clone(),
            key,
            Duration::from_millis(self.config.draft_debounce_ms),
        )
    }

    /// 保存结果集（JSON）
    async fn write_results(&self, job: &GenerationJob, report: &RunReport) -> Result<PathBuf> {
        let folder = Path::new(&self.config.output_folder);
        tokio::fs::create_dir_all(folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", folder.display()))?;

        let timestamp = chrono::Local::now();
        let path = folder.join(format!(
            "{}-{}.json",
            sanitize_file_name(&job.name),
            timestamp.format("%Y%m%d-%H%M%S")
        ));

        let output = json!({
            "job": job.name,
            "generated_at": timestamp.to_rfc3339(),
            "summary": report.progress.summary_message(),
            "attempts": report.attempts,
            "average_quality": report.result_set.average_quality(),
            "result_set": report.result_set,
        });

        tokio::fs::write(&path, serde_json::to_string_pretty(&output)?)
            .await
            .with_context(|| format!("无法写入结果文件: {}", path.display()))?;

        Ok(path)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ========== 日志辅助函数 ==========

fn log_job_complete(job: &GenerationJob, report: &RunReport, path: &Path) {
    info!("\n{}", "─".repeat(60));
    match report.status {
        RunStatus::AllSucceeded => info!("[任务 {}] ✅ {}", job.name, report.progress.summary_message()),
        RunStatus::PartialSuccess { .. } => {
            warn!("[任务 {}] ⚠️ {}", job.name, report.progress.summary_message());
            for message in report.result_set.warnings() {
                warn!("[任务 {}]    {}", job.name, message);
            }
        }
    }
    match report.result_set.average_quality() {
        Some(avg) => info!("[任务 {}] 平均质量评分: {:.1}", job.name, avg),
        None => info!("[任务 {}] 平均质量评分: N/A", job.name),
    }
    info!("[任务 {}] 结果已保存至: {}", job.name, path.display());
    info!("{}", "─".repeat(60));
}
