//! 生成客户端
//!
//! 每次调用只发出一次远端请求，失败被归类为可重试/不可重试，
//! 永远不返回 `Err`。重试由编排层决定。

pub mod classify;
pub mod http_client;
pub mod llm_client;

#[cfg(test)]
mod stub_server;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ClientKind, Config};
use crate::models::{GenerationOutcome, GenerationRequest};

pub use http_client::HttpGenerationClient;
pub use llm_client::LlmGenerationClient;

/// AI 生成客户端
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// 发出一次生成请求
    ///
    /// 没有缓存也不保证幂等，失败的调用也可能在远端计费。
    async fn generate(&self, request: &GenerationRequest, timeout: Duration) -> GenerationOutcome;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    async fn generate(&self, request: &GenerationRequest, timeout: Duration) -> GenerationOutcome {
        (**self).generate(request, timeout).await
    }
}

/// 按配置创建客户端
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn GenerationClient>> {
    let client: Arc<dyn GenerationClient> = match config.client_kind {
        ClientKind::Http => Arc::new(HttpGenerationClient::new(config)?),
        ClientKind::Llm => Arc::new(LlmGenerationClient::new(config)),
    };
    Ok(client)
}
