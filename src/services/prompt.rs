//! 提示词构建与模型响应解析

use regex::Regex;
use serde::Deserialize;

use crate::models::{GeneratedPost, GenerationRequest};

const SYSTEM_MESSAGE: &str = "당신은 병의원 마케팅 전문 블로그 작가입니다. \
의료법 광고 규정을 준수하며, 과장 광고, 치료 효과 보장, 비교 광고 표현을 사용하지 않습니다. \
항상 요청된 JSON 형식으로만 답변합니다.";

/// 构建 (system_message, user_message)
pub fn build_messages(request: &GenerationRequest) -> (String, String) {
    let style = request.style();

    let keywords = if style.keywords.is_empty() {
        "없음".to_string()
    } else {
        style.keywords.join(", ")
    };

    let user_message = format!(
        r#"아래 원문을 바탕으로 네이버 블로그용 글을 새로 작성해 주세요.

【작성 조건】
- 글 스타일: {}
- 어조: {}
- 분량: 약 {}자
- SEO 키워드: {}
- 원문의 의학적 사실은 유지하되 문장은 완전히 새로 작성
- 의료법에 저촉될 수 있는 표현(최고, 100%, 부작용 없음 등)은 사용 금지

【원문】
{}

【출력 형식】
다음 JSON 객체 하나만 출력하세요. 다른 설명은 쓰지 마세요.
{{"title": "글 제목", "content": "본문", "quality_score": 0부터 100 사이의 자체 평가 점수}}"#,
        style.writing_style.describe(),
        style.tone.describe(),
        style.target_length,
        keywords,
        request.source_text().trim()
    );

    (SYSTEM_MESSAGE.to_string(), user_message)
}

#[derive(Debug, Deserialize)]
struct RawPost {
    title: String,
    content: String,
    #[serde(default)]
    quality_score: Option<f64>,
}

/// 解析模型返回的文章
///
/// 优先按 JSON 解析（允许被 ```json 代码块包裹）；否则把第一行当标题、其余当正文。
pub fn parse_post(response: &str, model: &str) -> Result<GeneratedPost, String> {
    let fence = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").map_err(|e| e.to_string())?;
    let body = fence
        .captures(response)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
        .trim();

    if let Ok(raw) = serde_json::from_str::<RawPost>(body) {
        if raw.content.trim().is_empty() {
            return Err("生成内容为空".to_string());
        }
        return Ok(GeneratedPost {
            title: raw.title.trim().to_string(),
            content: raw.content.trim().to_string(),
            quality_score: raw.quality_score.map(|s| s.clamp(0.0, 100.0)),
            model: Some(model.to_string()),
        });
    }

    let mut lines = body.lines();
    let title = lines
        .next()
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .unwrap_or_default();
    let content = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    if content.is_empty() {
        return Err("生成内容为空".to_string());
    }

    Ok(GeneratedPost {
        title,
        content,
        quality_score: None,
        model: Some(model.to_string()),
    })
}
