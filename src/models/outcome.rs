//! 单次尝试的结果

use serde::{Deserialize, Serialize};

/// 生成的文章
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
    /// 质量评分（0-100），后端或模型未给出时为空
    #[serde(default)]
    pub quality_score: Option<f64>,
    /// 生成该文章的模型
    #[serde(default)]
    pub model: Option<String>,
}

/// 一次生成尝试的结果
///
/// 每次尝试产生一个，而不是每个条目一个：重试会为同一条目产生多个结果。
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success { payload: GeneratedPost },
    Failure { reason: String, is_transient: bool },
}

impl GenerationOutcome {
    pub fn success(payload: GeneratedPost) -> Self {
        GenerationOutcome::Success { payload }
    }

    /// 可重试的失败（网络、超时、5xx）
    pub fn transient(reason: impl Into<String>) -> Self {
        GenerationOutcome::Failure {
            reason: reason.into(),
            is_transient: true,
        }
    }

    /// 不可重试的失败（4xx、参数校验）
    pub fn permanent(reason: impl Into<String>) -> Self {
        GenerationOutcome::Failure {
            reason: reason.into(),
            is_transient: false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationOutcome::Failure {
                is_transient: true,
                ..
            }
        )
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Success { .. } => None,
            GenerationOutcome::Failure { reason, .. } => Some(reason),
        }
    }
}
