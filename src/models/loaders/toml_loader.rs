use crate::error::{AppError, AppResult, FileError};
use crate::models::import_job::ImportJob;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载一个导入任务
pub async fn load_import_job(toml_file_path: &Path) -> AppResult<ImportJob> {
    let display = toml_file_path.to_string_lossy().to_string();

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    let job: ImportJob = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
        path: display.clone(),
        source,
    })?;

    Ok(job.with_file_path(display))
}

/// 从文件夹中加载所有导入任务，按文件名排序
///
/// 单个文件解析失败只记录警告，不影响其他任务。
pub async fn load_all_import_jobs(folder_path: &str) -> AppResult<Vec<ImportJob>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut jobs = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_import_job(&path).await {
            Ok(job) => {
                tracing::info!("成功加载导入任务 (试卷 {})", job.exam_id);
                jobs.push(job);
            }
            Err(e) => {
                tracing::warn!("⚠️ 加载文件失败，已跳过: {}", e);
            }
        }
    }

    Ok(jobs)
}
