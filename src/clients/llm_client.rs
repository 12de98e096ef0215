//! LLM 生成客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - GPT 与 Gemini 都走 OpenAI 兼容接口，模型 ID 来自 `Provider`

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, warn};

use crate::clients::classify::is_transient_openai;
use crate::clients::GenerationClient;
use crate::config::Config;
use crate::models::{GenerationOutcome, GenerationRequest, MIN_SOURCE_CHARS};
use crate::services::prompt;

/// LLM 生成客户端
pub struct LlmGenerationClient {
    client: Client<OpenAIConfig>,
}

impl LlmGenerationClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        Self::with_api_base(&config.llm_api_key, &config.llm_api_base_url)
    }

    /// 使用自定义端点创建
    ///
    /// async-openai 默认会对 5xx/429 做长达 15 分钟的指数退避重试；
    /// 这里把退避时长设为 0，一次 `generate` 只发出一次请求，重试交给编排层。
    pub fn with_api_base(api_key: &str, api_base: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        let single_attempt = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Self {
            client: Client::with_config(openai_config).with_backoff(single_attempt),
        }
    }

    /// 调用 LLM，返回原始文本
    async fn complete(&self, request: &GenerationRequest) -> Result<String, OpenAIError> {
        let model = request.target().model_id();
        let (system_message, user_message) = prompt::build_messages(request);

        debug!("调用 LLM API，模型: {}", model);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_message)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()?,
            ),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(4096u32)
            .build()?;

        let response = self.client.chat().create(chat_request).await?;

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl GenerationClient for LlmGenerationClient {
    async fn generate(&self, request: &GenerationRequest, timeout: Duration) -> GenerationOutcome {
        if !request.has_enough_source() {
            return GenerationOutcome::permanent(format!(
                "原文过短，至少需要 {} 个字符",
                MIN_SOURCE_CHARS
            ));
        }

        let model = request.target().model_id();

        let content = match tokio::time::timeout(timeout, self.complete(request)).await {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                warn!("LLM API 调用失败: {}", e);
                return GenerationOutcome::Failure {
                    reason: format!("LLM API 调用失败: {}", e),
                    is_transient: is_transient_openai(&e),
                };
            }
            Err(_) => {
                warn!("LLM API 调用超时 ({} 秒)", timeout.as_secs());
                return GenerationOutcome::transient(format!(
                    "LLM API 调用超时 ({} 秒)",
                    timeout.as_secs()
                ));
            }
        };

        debug!("LLM API 调用成功");

        match prompt::parse_post(&content, model) {
            Ok(post) => GenerationOutcome::success(post),
            Err(reason) => GenerationOutcome::permanent(reason),
        }
    }
}
