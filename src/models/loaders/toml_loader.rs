use crate::error::JobError;
use crate::models::job::GenerationJob;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载生成任务
pub async fn load_job(toml_file_path: &Path) -> Result<GenerationJob, JobError> {
    let path_str = toml_file_path.display().to_string();

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| JobError::Read {
            path: path_str.clone(),
            source,
        })?;

    let mut job: GenerationJob = toml::from_str(&content).map_err(|source| JobError::Parse {
        path: path_str.clone(),
        source,
    })?;

    // 设置文件路径
    job.file_path = Some(path_str);

    Ok(job)
}

/// 从文件夹中加载所有任务文件
///
/// 单个文件加载失败只记录警告，不影响其他文件。结果按文件名排序。
pub async fn load_all_jobs(folder_path: &str) -> Result<Vec<GenerationJob>, JobError> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(JobError::DirectoryNotFound(folder_path.to_string()));
    }

    let mut entries = fs::read_dir(&folder).await.map_err(|source| JobError::Read {
        path: folder_path.to_string(),
        source,
    })?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|source| JobError::Read {
        path: folder_path.to_string(),
        source,
    })? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut jobs = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_job(&path).await {
            Ok(job) => {
                tracing::info!("成功加载任务 {}，需生成 {} 篇", job.name, job.count);
                jobs.push(job);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(jobs)
}
