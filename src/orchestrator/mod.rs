//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量生成编排器
//! - 串行 / 小批量并发两种节奏
//! - 按条目重试（`item` 状态机）
//! - 全部失败时返回错误，部分失败时返回带警告的成功
//!
//! ### `progress` - 进度汇报
//! - 终态计数与失败信息，供界面轮询
//!
//! ### `aggregator` - 结果汇总
//! - 按提交顺序排列成功结果，默认选中第一个
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 N 个条目)
//!     ↓
//! item (单个条目：尝试 → 重试 → 终态)
//!     ↓
//! clients::GenerationClient (单次远端调用)
//! ```

pub mod aggregator;
pub mod batch_processor;
pub mod item;
pub mod policy;
pub mod progress;

// 重新导出主要类型
pub use aggregator::{finalize, ResultEntry, ResultSet};
pub use batch_processor::{Orchestrator, RunReport, RunStatus};
pub use item::{ItemPhase, ItemSlot, Transition};
pub use policy::{Pacing, RetryPolicy, RunPolicy};
pub use progress::{ProgressReporter, ProgressState};
