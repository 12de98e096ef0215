//! 草稿存储
//!
//! 由调用方持有并注入的键值存储，没有进程级的全局状态。
//! 生命周期：挂载时读取 → 变更后防抖写入 → 生成成功后清除。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::DraftError;

/// 键值草稿存储
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, DraftError>;
    async fn save(&self, key: &str, value: &str) -> Result<(), DraftError>;
    async fn clear(&self, key: &str) -> Result<(), DraftError>;
    /// 当前保存的所有键
    async fn keys(&self) -> Result<Vec<String>, DraftError>;
}

#[async_trait]
impl<T: DraftStore + ?Sized> DraftStore for Arc<T> {
    async fn load(&self, key: &str) -> Result<Option<String>, DraftError> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), DraftError> {
        (**self).save(key, value).await
    }

    async fn clear(&self, key: &str) -> Result<(), DraftError> {
        (**self).clear(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, DraftError> {
        (**self).keys().await
    }
}

/// 内存草稿存储
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn load(&self, key: &str) -> Result<Option<String>, DraftError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), DraftError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), DraftError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, DraftError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// 文件草稿存储：每个键一个 JSON 文件
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl DraftStore for FileDraftStore {
    async fn load(&self, key: &str) -> Result<Option<String>, DraftError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DraftError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), DraftError> {
        let io_err = |source| DraftError::Io {
            key: key.to_string(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(io_err)
    }

    async fn clear(&self, key: &str) -> Result<(), DraftError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DraftError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// 目录中每个 `.json` 文件的文件名（不含扩展名）
    async fn keys(&self) -> Result<Vec<String>, DraftError> {
        let io_err = |source| DraftError::Io {
            key: self.dir.display().to_string(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_err(source)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// 防抖自动保存
///
/// 最后一次变更后静默 `debounce` 才写入；`flush` 立即写入未保存的草稿。
pub struct DraftAutosaver<S, T> {
    store: S,
    key: String,
    debounce: Duration,
    pending: Option<T>,
    last_change: Option<Instant>,
    _draft: PhantomData<fn() -> T>,
}

impl<S, T> DraftAutosaver<S, T>
where
    S: DraftStore,
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: S, key: impl Into<String>, debounce: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            debounce,
            pending: None,
            last_change: None,
            _draft: PhantomData,
        }
    }

    /// 挂载时读取草稿；损坏的草稿被丢弃
    pub async fn load_on_mount(&self) -> Result<Option<T>, DraftError> {
        let Some(raw) = self.store.load(&self.key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(draft) => Ok(Some(draft)),
            Err(e) => {
                warn!("草稿 {} 已损坏，忽略: {}", self.key, e);
                Ok(None)
            }
        }
    }

    /// 记录变更，等待防抖后写入
    pub fn on_change(&mut self, draft: T) {
        self.pending = Some(draft);
        self.last_change = Some(Instant::now());
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// 静默期已过则写入，返回是否写入
    pub async fn tick(&mut self) -> Result<bool, DraftError> {
        let quiet = self
            .last_change
            .map(|at| at.elapsed() >= self.debounce)
            .unwrap_or(false);
        if !quiet {
            return Ok(false);
        }
        self.flush().await
    }

    /// 立即写入未保存的草稿，返回是否写入
    pub async fn flush(&mut self) -> Result<bool, DraftError> {
        let Some(draft) = self.pending.take() else {
            return Ok(false);
        };

        let raw = serde_json::to_string(&draft).map_err(|source| DraftError::Serde {
            key: self.key.clone(),
            source,
        })?;

        if let Err(e) = self.store.save(&self.key, &raw).await {
            // 写入失败时保留草稿，下次再试
            self.pending = Some(draft);
            return Err(e);
        }

        self.last_change = None;
        debug!("草稿已保存: {}", self.key);
        Ok(true)
    }

    /// 生成成功后清除草稿
    pub async fn clear_on_success(&mut self) -> Result<(), DraftError> {
        self.pending = None;
        self.last_change = None;
        self.store.clear(&self.key).await
    }
}
