//! # Doctor Voice Gen
//!
//! 批量生成医疗机构博客文章的编排工具
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 生成请求、AI 提供方、单次结果、任务文件
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 单次远端生成调用，负责超时和失败分类
//! - `HttpGenerationClient` - 通过后端 REST 接口生成
//! - `LlmGenerationClient` - 直接调用 OpenAI 兼容接口
//!
//! ### ③ 能力层（Services）
//! - `services/` - 提示词构建、草稿存储
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 串行 / 小批量并发编排，按条目重试
//! - `orchestrator/progress` - 进度汇报
//! - `orchestrator/aggregator` - 结果汇总
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use clients::GenerationClient;
pub use config::Config;
pub use error::{OrchestrationError, ProviderError};
pub use models::{GeneratedPost, GenerationOutcome, GenerationRequest, Provider};
pub use orchestrator::{Orchestrator, ResultSet, RunPolicy, RunReport, RunStatus};
