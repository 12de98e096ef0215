//! AI 提供方与模型
//!
//! 提供方是封闭的枚举，每个提供方只携带自己支持的模型，
//! 所有分支都通过 `match` 穷尽处理，不做字符串比较。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProviderError;

/// GPT 系列模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GptModel {
    Gpt4o,
    Gpt4oMini,
    Gpt41,
}

/// Gemini 系列模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeminiModel {
    Gemini20Flash,
    Gemini25Flash,
    Gemini25Pro,
}

impl GptModel {
    pub const ALL: [GptModel; 3] = [GptModel::Gpt4o, GptModel::Gpt4oMini, GptModel::Gpt41];

    /// 远端 API 使用的模型 ID
    pub fn id(self) -> &'static str {
        match self {
            GptModel::Gpt4o => "gpt-4o",
            GptModel::Gpt4oMini => "gpt-4o-mini",
            GptModel::Gpt41 => "gpt-4.1",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }
}

impl GeminiModel {
    pub const ALL: [GeminiModel; 3] = [
        GeminiModel::Gemini20Flash,
        GeminiModel::Gemini25Flash,
        GeminiModel::Gemini25Pro,
    ];

    /// 远端 API 使用的模型 ID
    pub fn id(self) -> &'static str {
        match self {
            GeminiModel::Gemini20Flash => "gemini-2.0-flash",
            GeminiModel::Gemini25Flash => "gemini-2.5-flash",
            GeminiModel::Gemini25Pro => "gemini-2.5-pro",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }
}

/// AI 提供方（带已校验的模型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "provider", content = "model", rename_all = "lowercase")]
pub enum Provider {
    Gpt(GptModel),
    Gemini(GeminiModel),
}

impl Provider {
    /// 从界面传入的 (provider, model) 字符串对解析
    ///
    /// 模型必须属于对应的提供方，例如 `("gpt", "gemini-2.5-pro")` 会被拒绝。
    pub fn parse(provider: &str, model: &str) -> Result<Self, ProviderError> {
        match provider.trim().to_ascii_lowercase().as_str() {
            "gpt" | "openai" => GptModel::from_id(model.trim())
                .map(Provider::Gpt)
                .ok_or_else(|| ProviderError::UnsupportedModel {
                    provider: "gpt".to_string(),
                    model: model.to_string(),
                }),
            "gemini" | "google" => GeminiModel::from_id(model.trim())
                .map(Provider::Gemini)
                .ok_or_else(|| ProviderError::UnsupportedModel {
                    provider: "gemini".to_string(),
                    model: model.to_string(),
                }),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }

    /// 提供方名称（发送给后端的 `ai_provider` 字段）
    pub fn name(self) -> &'static str {
        match self {
            Provider::Gpt(_) => "gpt",
            Provider::Gemini(_) => "gemini",
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            Provider::Gpt(model) => model.id(),
            Provider::Gemini(model) => model.id(),
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::Gpt(GptModel::Gpt4oMini)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name(), self.model_id())
    }
}
