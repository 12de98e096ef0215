/// 后端生成 API 客户端
///
/// 每次调用向后端发出一次 `POST /api/v1/generate`
use crate::clients::classify::{is_transient_reqwest, is_transient_status};
use crate::clients::GenerationClient;
use crate::config::Config;
use crate::models::{GeneratedPost, GenerationOutcome, GenerationRequest, MIN_SOURCE_CHARS};
use crate::utils::logging::truncate_text;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const GENERATE_PATH: &str = "/api/v1/generate";

/// 后端生成客户端
pub struct HttpGenerationClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// 请求体
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    original_content: &'a str,
    writing_style: crate::models::WritingStyle,
    target_length: u32,
    tone: crate::models::Tone,
    keywords: &'a [String],
    ai_provider: &'static str,
    ai_model: &'static str,
}

impl<'a> From<&'a GenerationRequest> for GenerateBody<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        let style = request.style();
        Self {
            original_content: request.source_text(),
            writing_style: style.writing_style,
            target_length: style.target_length,
            tone: style.tone,
            keywords: &style.keywords,
            ai_provider: request.target().name(),
            ai_model: request.target().model_id(),
        }
    }
}

/// 错误响应体 `{ "detail": ... }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

impl HttpGenerationClient {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.api_base_url, &config.api_token)
    }

    /// 使用自定义地址创建
    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GENERATE_PATH)
    }

    async fn send(&self, request: &GenerationRequest) -> GenerationOutcome {
        let body = GenerateBody::from(request);

        let mut builder = self.http.post(self.endpoint()).json(&body);
        if !self.token.is_empty() {
            builder = builder.bearer_auth(&self.token);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("生成请求发送失败: {}", e);
                return GenerationOutcome::Failure {
                    reason: format!("网络错误: {}", e),
                    is_transient: is_transient_reqwest(&e),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = error_detail(status.as_u16(), &text);
            warn!("生成接口返回错误: {}", reason);
            return GenerationOutcome::Failure {
                reason,
                is_transient: is_transient_status(status.as_u16()),
            };
        }

        match response.json::<GeneratedPost>().await {
            Ok(post) if post.content.trim().is_empty() => {
                GenerationOutcome::permanent("生成内容为空")
            }
            Ok(mut post) => {
                if post.model.is_none() {
                    post.model = Some(request.target().model_id().to_string());
                }
                debug!("生成成功，正文长度: {} 字符", post.content.chars().count());
                GenerationOutcome::success(post)
            }
            Err(e) => GenerationOutcome::Failure {
                reason: format!("响应解析失败: {}", e),
                is_transient: is_transient_reqwest(&e),
            },
        }
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest, timeout: Duration) -> GenerationOutcome {
        if !request.has_enough_source() {
            return GenerationOutcome::permanent(format!(
                "原文过短，至少需要 {} 个字符",
                MIN_SOURCE_CHARS
            ));
        }

        debug!(
            "调用生成接口，模型: {}，原文长度: {} 字符",
            request.target(),
            request.source_text().chars().count()
        );

        match tokio::time::timeout(timeout, self.send(request)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("生成请求超时 ({} 秒)", timeout.as_secs());
                GenerationOutcome::transient(format!("请求超时 ({} 秒)", timeout.as_secs()))
            }
        }
    }
}

/// 从错误响应中提取可读信息
///
/// FastAPI 的 `detail` 可能是字符串，也可能是校验错误数组。
fn error_detail(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Value::String(detail),
        }) => format!("HTTP {}: {}", status, detail),
        Ok(ErrorBody { detail }) => format!("HTTP {}: {}", status, detail),
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, truncate_text(body.trim(), 200)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::stub_server::StubServer;
    use crate::models::{GeminiModel, Provider, StyleParams};

    #[test]
    fn test_error_detail_string() {
        let reason = error_detail(400, r#"{"detail":"원본 내용이 너무 짧습니다"}"#);
        assert_eq!(reason, "HTTP 400: 원본 내용이 너무 짧습니다");
    }

    #[test]
    fn test_error_detail_validation_array() {
        let reason = error_detail(422, r#"{"detail":[{"loc":["body","tone"],"msg":"invalid"}]}"#);
        assert!(reason.starts_with("HTTP 422: ["));
        assert!(reason.contains("invalid"));
    }

    #[test]
    fn test_error_detail_non_json() {
        assert_eq!(error_detail(502, ""), "HTTP 502");
        assert_eq!(error_detail(502, "Bad Gateway"), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn test_body_carries_provider_and_model() {
        let request = GenerationRequest::new(
            "원문",
            StyleParams::default(),
            Provider::Gemini(GeminiModel::Gemini25Pro),
        );
        let body = serde_json::to_value(GenerateBody::from(&request)).unwrap();
        assert_eq!(body["ai_provider"], "gemini");
        assert_eq!(body["ai_model"], "gemini-2.5-pro");
        assert_eq!(body["original_content"], "원문");
        assert_eq!(body["tone"], "professional");
    }

    #[tokio::test]
    async fn test_short_source_fails_without_network() {
        let client = HttpGenerationClient::with_base_url("http://127.0.0.1:9", "").unwrap();
        let request = GenerationRequest::new("짧음", StyleParams::default(), Provider::default());
        let outcome = client.generate(&request, Duration::from_secs(1)).await;
        assert!(!outcome.is_success());
        assert!(!outcome.is_transient());
    }

    fn long_request() -> GenerationRequest {
        GenerationRequest::new(
            "치아 미백 시술 전후 주의사항을 안내드립니다. ".repeat(4),
            StyleParams::default(),
            Provider::Gemini(GeminiModel::Gemini25Flash),
        )
    }

    async fn generate_against(status_line: &'static str, body: &str) -> (GenerationOutcome, usize) {
        let server = StubServer::start(status_line, body).await;
        let client = HttpGenerationClient::with_base_url(&server.base_url, "token").unwrap();
        let outcome = client.generate(&long_request(), Duration::from_secs(5)).await;
        (outcome, server.hits())
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let (outcome, hits) =
            generate_against("503 Service Unavailable", r#"{"detail":"모델 서버 과부하"}"#).await;
        assert_eq!(hits, 1);
        assert!(outcome.is_transient());
        assert_eq!(outcome.failure_reason(), Some("HTTP 503: 모델 서버 과부하"));
    }

    #[tokio::test]
    async fn test_validation_error_is_permanent_with_detail() {
        let (outcome, hits) = generate_against(
            "422 Unprocessable Entity",
            r#"{"detail":"원본 내용이 너무 짧습니다"}"#,
        )
        .await;
        assert_eq!(hits, 1);
        assert!(!outcome.is_success());
        assert!(!outcome.is_transient());
        assert_eq!(outcome.failure_reason(), Some("HTTP 422: 원본 내용이 너무 짧습니다"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_permanent() {
        let (outcome, _) = generate_against("429 Too Many Requests", r#"{"detail":"too many"}"#).await;
        assert!(!outcome.is_success());
        assert!(!outcome.is_transient());
    }

    #[tokio::test]
    async fn test_empty_content_is_permanent() {
        let (outcome, hits) =
            generate_against("200 OK", r#"{"title":"제목","content":"   "}"#).await;
        assert_eq!(hits, 1);
        assert!(!outcome.is_transient());
        assert_eq!(outcome.failure_reason(), Some("生成内容为空"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_permanent() {
        let (outcome, _) = generate_against("200 OK", r#"{"unexpected":true}"#).await;
        assert!(!outcome.is_success());
        assert!(!outcome.is_transient());
    }

    #[tokio::test]
    async fn test_success_fills_missing_model() {
        let (outcome, hits) = generate_against(
            "200 OK",
            r#"{"title":"미백 안내","content":"본문","quality_score":91.5}"#,
        )
        .await;
        assert_eq!(hits, 1);
        match outcome {
            GenerationOutcome::Success { payload } => {
                assert_eq!(payload.title, "미백 안내");
                assert_eq!(payload.quality_score, Some(91.5));
                assert_eq!(payload.model.as_deref(), Some("gemini-2.5-flash"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        // 端口 9 (discard) 在测试环境中通常没有监听
        let client = HttpGenerationClient::with_base_url("http://127.0.0.1:9", "").unwrap();
        let request = GenerationRequest::new(
            "치아 미백 시술 전후 주의사항을 안내드립니다. ".repeat(4),
            StyleParams::default(),
            Provider::default(),
        );
        let outcome = client.generate(&request, Duration::from_secs(5)).await;
        assert!(outcome.is_transient());
    }
}
