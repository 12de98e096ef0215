//! 生成任务（TOML 任务文件的内容）

use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::models::provider::Provider;
use crate::models::request::{GenerationRequest, StyleParams, MIN_SOURCE_CHARS};

/// 节奏策略类型（任务文件里的 `pacing` 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingKind {
    /// 串行：一次一个，条目间固定间隔
    #[default]
    Sequential,
    /// 小批量并发：每批固定数量，批间固定间隔
    Batched,
}

/// 一个生成任务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// 任务名称（用于日志和输出文件名）
    pub name: String,
    /// 需要生成的篇数
    pub count: usize,
    /// 原文
    pub source_text: String,
    #[serde(default)]
    pub style: StyleParams,
    pub ai_provider: String,
    pub ai_model: String,
    #[serde(default)]
    pub pacing: PacingKind,
    /// 任务文件路径（加载时设置）
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl GenerationJob {
    /// 校验任务并解析出 AI 目标
    pub fn validate(&self) -> Result<Provider, JobError> {
        if self.count == 0 {
            return Err(JobError::InvalidCount {
                name: self.name.clone(),
            });
        }

        let chars = self.source_text.trim().chars().count();
        if chars < MIN_SOURCE_CHARS {
            return Err(JobError::SourceTooShort {
                name: self.name.clone(),
                chars,
                min: MIN_SOURCE_CHARS,
            });
        }

        Provider::parse(&self.ai_provider, &self.ai_model).map_err(|source| JobError::Provider {
            name: self.name.clone(),
            source,
        })
    }

    /// 构建单个条目的请求
    ///
    /// 同一任务的所有条目共享同一份原文和风格参数。
    pub fn request(&self, target: Provider) -> GenerationRequest {
        GenerationRequest::new(self.source_text.clone(), self.style.clone(), target)
    }
}
