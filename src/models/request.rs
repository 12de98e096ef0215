//! 生成请求
//!
//! `GenerationRequest` 在编排开始时为每个条目创建一次，之后只读。

use serde::{Deserialize, Serialize};

use crate::models::provider::Provider;

/// 原文最少字符数（界面层在进入本模块前已校验，客户端再兜底一次）
pub const MIN_SOURCE_CHARS: usize = 50;

/// 写作风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingStyle {
    /// 信息型
    #[default]
    Informative,
    /// 共情型
    Empathetic,
    /// 体验分享型
    Storytelling,
}

impl WritingStyle {
    pub fn describe(self) -> &'static str {
        match self {
            WritingStyle::Informative => "정보 전달형 (객관적이고 신뢰감 있는 설명)",
            WritingStyle::Empathetic => "공감형 (환자의 고민에 공감하는 따뜻한 어조)",
            WritingStyle::Storytelling => "경험 공유형 (실제 상담 사례처럼 자연스럽게)",
        }
    }
}

/// 语气
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Casual,
}

impl Tone {
    pub fn describe(self) -> &'static str {
        match self {
            Tone::Professional => "전문적인",
            Tone::Friendly => "친근한",
            Tone::Casual => "편안한 구어체",
        }
    }
}

/// 风格参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleParams {
    #[serde(default)]
    pub writing_style: WritingStyle,
    /// 目标字数
    #[serde(default = "default_target_length")]
    pub target_length: u32,
    #[serde(default)]
    pub tone: Tone,
    /// SEO 关键词
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_target_length() -> u32 {
    1500
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            writing_style: WritingStyle::default(),
            target_length: default_target_length(),
            tone: Tone::default(),
            keywords: Vec::new(),
        }
    }
}

/// 单个条目的生成请求（不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    source_text: String,
    style: StyleParams,
    target: Provider,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, style: StyleParams, target: Provider) -> Self {
        Self {
            source_text: source_text.into(),
            style,
            target,
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn style(&self) -> &StyleParams {
        &self.style
    }

    pub fn target(&self) -> Provider {
        self.target
    }

    /// 原文是否达到最低长度
    pub fn has_enough_source(&self) -> bool {
        self.source_text.trim().chars().count() >= MIN_SOURCE_CHARS
    }
}
