use thiserror::Error;

/// AI 提供方解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// 不支持的提供方
    #[error("不支持的 AI 提供方: {0}")]
    UnknownProvider(String),
    /// 模型不属于该提供方
    #[error("提供方 {provider} 不支持模型 {model}")]
    UnsupportedModel { provider: String, model: String },
}

/// 编排错误
///
/// 单个条目的失败不会在这里出现，只会记录到进度里；
/// 只有"全部失败"才作为错误返回给调用方。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    /// 生成数量必须 >= 1
    #[error("生成数量必须至少为 1")]
    InvalidCount,
    /// 所有条目都以失败告终
    #[error("生成失败: {total} 个全部失败")]
    AllFailed { total: usize, errors: Vec<String> },
}

/// 草稿存储错误
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("草稿读写失败 ({key}): {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("草稿序列化失败 ({key}): {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 任务文件错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("无法读取任务文件 {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("无法解析任务文件 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("任务 {name} 的生成数量必须至少为 1")]
    InvalidCount { name: String },
    #[error("任务 {name} 的原文过短 ({chars} 字符，至少 {min} 字符)")]
    SourceTooShort {
        name: String,
        chars: usize,
        min: usize,
    },
    #[error("任务 {name} 的 AI 配置无效: {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },
    #[error("目录不存在: {0}")]
    DirectoryNotFound(String),
}

/// 编排结果类型
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
