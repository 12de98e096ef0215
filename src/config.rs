use std::str::FromStr;
use std::time::Duration;

/// 生成客户端类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientKind {
    /// 通过后端 REST 接口生成
    Http,
    /// 直接调用 OpenAI 兼容的 LLM 接口
    Llm,
}

impl ClientKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" | "backend" => Some(ClientKind::Http),
            "llm" | "openai" => Some(ClientKind::Llm),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 生成客户端类型
    pub client_kind: ClientKind,
    // --- 后端 API 配置 ---
    pub api_base_url: String,
    pub api_token: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    // --- 重试与节奏 ---
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 每个条目的最大重试次数
    pub max_retries: u32,
    /// 重试前等待（秒）
    pub retry_backoff_secs: u64,
    /// 串行模式：成功后等待（秒）
    pub success_delay_secs: u64,
    /// 串行模式：失败后等待（秒）
    pub failure_delay_secs: u64,
    /// 批量模式：每批数量
    pub batch_size: usize,
    /// 批量模式：批间等待（秒）
    pub batch_delay_secs: u64,
    // --- 文件 ---
    /// 任务 TOML 文件目录
    pub job_folder: String,
    /// 生成结果输出目录
    pub output_folder: String,
    /// 草稿目录
    pub draft_folder: String,
    /// 草稿自动保存间隔（毫秒）
    pub draft_debounce_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_kind: ClientKind::Http,
            api_base_url: "http://localhost:8010".to_string(),
            api_token: String::new(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            request_timeout_secs: 120,
            max_retries: 2,
            retry_backoff_secs: 5,
            success_delay_secs: 2,
            failure_delay_secs: 3,
            batch_size: 3,
            batch_delay_secs: 1,
            job_folder: "jobs".to_string(),
            output_folder: "output".to_string(),
            draft_folder: ".drafts".to_string(),
            draft_debounce_ms: 1000,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，缺失或无法解析的值使用默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            client_kind: lookup("CLIENT_KIND").and_then(|v| ClientKind::parse(&v)).unwrap_or(default.client_kind),
            api_base_url: lookup("API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: lookup("API_TOKEN").unwrap_or(default.api_token),
            llm_api_key: lookup("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS").unwrap_or(default.request_timeout_secs),
            max_retries: parse_var(&lookup, "MAX_RETRIES").unwrap_or(default.max_retries),
            retry_backoff_secs: parse_var(&lookup, "RETRY_BACKOFF_SECS").unwrap_or(default.retry_backoff_secs),
            success_delay_secs: parse_var(&lookup, "SUCCESS_DELAY_SECS").unwrap_or(default.success_delay_secs),
            failure_delay_secs: parse_var(&lookup, "FAILURE_DELAY_SECS").unwrap_or(default.failure_delay_secs),
            batch_size: parse_var(&lookup, "BATCH_SIZE").filter(|&n: &usize| n > 0).unwrap_or(default.batch_size),
            batch_delay_secs: parse_var(&lookup, "BATCH_DELAY_SECS").unwrap_or(default.batch_delay_secs),
            job_folder: lookup("JOB_FOLDER").unwrap_or(default.job_folder),
            output_folder: lookup("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            draft_folder: lookup("DRAFT_FOLDER").unwrap_or(default.draft_folder),
            draft_debounce_ms: parse_var(&lookup, "DRAFT_DEBOUNCE_MS").unwrap_or(default.draft_debounce_ms),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.client_kind, ClientKind::Http);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("CLIENT_KIND", "LLM"),
            ("MAX_RETRIES", "4"),
            ("BATCH_SIZE", "0"),
            ("RETRY_BACKOFF_SECS", "soon"),
            ("VERBOSE_LOGGING", "true"),
        ]));
        assert_eq!(config.client_kind, ClientKind::Llm);
        assert_eq!(config.max_retries, 4);
        // 0 不是合法的批大小
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.retry_backoff_secs, 5);
        assert!(config.verbose_logging);
    }
}
