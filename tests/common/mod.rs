//! 测试用的脚本化生成客户端

#![allow(dead_code)]

use async_trait::async_trait;
use doctor_voice_gen::models::{GeneratedPost, GenerationOutcome, GenerationRequest, Provider, StyleParams};
use doctor_voice_gen::GenerationClient;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// 单次尝试的脚本
#[derive(Debug, Clone)]
pub enum Step {
    Succeed { score: Option<f64> },
    Transient,
    Permanent,
}

/// 一次调用的记录
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub index: usize,
    pub started: Instant,
    pub finished: Instant,
}

/// 按条目编号返回预设结果的客户端
///
/// 条目编号写在原文开头（`"03|..."`，没有编号时按 0 处理），脚本用完后默认成功。
pub struct ScriptedClient {
    scripts: Mutex<HashMap<usize, VecDeque<Step>>>,
    latencies: Mutex<HashMap<usize, Duration>>,
    default_latency: Duration,
    calls: Mutex<Vec<CallRecord>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            latencies: Mutex::new(HashMap::new()),
            default_latency: Duration::from_millis(100),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// 为条目（0 起始）设置尝试脚本
    pub fn with_script(self, index: usize, steps: Vec<Step>) -> Self {
        self.scripts.lock().unwrap().insert(index, steps.into());
        self
    }

    pub fn with_latency(self, index: usize, latency: Duration) -> Self {
        self.latencies.lock().unwrap().insert(index, latency);
        self
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, index: usize) -> usize {
        self.calls().iter().filter(|c| c.index == index).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: &GenerationRequest, _timeout: Duration) -> GenerationOutcome {
        let index: usize = request
            .source_text()
            .get(..2)
            .and_then(|prefix| prefix.parse().ok())
            .unwrap_or(0);
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&index)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(Step::Succeed { score: None });
        let latency = self
            .latencies
            .lock()
            .unwrap()
            .get(&index)
            .copied()
            .unwrap_or(self.default_latency);

        let started = Instant::now();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(CallRecord {
            index,
            started,
            finished: Instant::now(),
        });

        match step {
            Step::Succeed { score } => GenerationOutcome::success(GeneratedPost {
                title: format!("item-{}", index + 1),
                content: format!("본문 {}", index + 1),
                quality_score: score,
                model: Some(request.target().model_id().to_string()),
            }),
            Step::Transient => GenerationOutcome::transient("HTTP 503: Service Unavailable"),
            Step::Permanent => GenerationOutcome::permanent("HTTP 422: invalid style"),
        }
    }
}

/// 为第 `index` 个条目构建请求（编号写在原文开头）
pub fn request_for(index: usize) -> GenerationRequest {
    GenerationRequest::new(
        format!("{:02}|{}", index, "스케일링 후 시린 증상은 대부분 일시적입니다. ".repeat(3)),
        StyleParams::default(),
        Provider::default(),
    )
}

pub fn titles(report: &doctor_voice_gen::RunReport) -> Vec<String> {
    report
        .result_set
        .posts()
        .map(|post| post.title.clone())
        .collect()
}
