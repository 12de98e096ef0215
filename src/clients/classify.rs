//! 失败分类
//!
//! 网络错误、超时、5xx → 可重试；4xx（包括 408/429）、解码失败、参数错误 → 不可重试。
//! 所有函数都是纯函数：同一个错误总是得到同一个分类。

use async_openai::error::{ApiError, OpenAIError};

/// 按 HTTP 状态码判断是否可重试
pub fn is_transient_status(status: u16) -> bool {
    status >= 500
}

/// 按 reqwest 错误判断是否可重试
pub fn is_transient_reqwest(err: &reqwest::Error) -> bool {
    if let Some(status) = err.status() {
        return is_transient_status(status.as_u16());
    }
    if err.is_decode() || err.is_builder() || err.is_redirect() {
        return false;
    }
    // 连接、超时、读取响应体等网络层错误
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

/// 按 OpenAI 兼容接口返回的错误对象判断是否可重试
///
/// async-openai 遇到 5xx 时不解析响应体，直接把原文放进 `message`，
/// `type`/`param`/`code` 全为空；4xx 的错误对象总是经过 JSON 解析。
pub fn is_transient_api_error(api: &ApiError) -> bool {
    let server_error_shape = api.r#type.is_none() && api.param.is_none() && api.code.is_none();
    server_error_shape
        || matches!(
            api.r#type.as_deref(),
            Some("server_error" | "overloaded_error")
        )
}

/// 按 async-openai 错误判断是否可重试
pub fn is_transient_openai(err: &OpenAIError) -> bool {
    match err {
        OpenAIError::Reqwest(_) => true,
        OpenAIError::ApiError(api) => is_transient_api_error(api),
        _ => false,
    }
}
