use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// JSON 存储文件路径
    pub store_path: String,
    /// 待导入的 TOML 任务目录
    pub import_folder: String,
    /// 批量导入时两道题之间的间隔（毫秒），用于避开存储的写入限流
    pub bulk_item_delay_ms: u64,
    /// 写入失败后重试前的等待时间（毫秒）
    pub retry_backoff_ms: u64,
    /// 试卷列表缓存的有效期（秒）
    pub exam_cache_ttl_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 导入失败 / 答案解析兜底的记录文件
    pub warn_file: String,
    /// 导入完全成功后是否删除任务文件
    pub delete_imported_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: "exam_store.json".to_string(),
            import_folder: "imports".to_string(),
            bulk_item_delay_ms: 500,
            retry_backoff_ms: 1000,
            exam_cache_ttl_secs: 500 * 60,
            verbose_logging: false,
            output_log_file: "import_log.txt".to_string(),
            warn_file: "warn.txt".to_string(),
            delete_imported_files: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            store_path: std::env::var("STORE_PATH").unwrap_or(default.store_path),
            import_folder: std::env::var("IMPORT_FOLDER").unwrap_or(default.import_folder),
            bulk_item_delay_ms: std::env::var("BULK_ITEM_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.bulk_item_delay_ms),
            retry_backoff_ms: std::env::var("RETRY_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_backoff_ms),
            exam_cache_ttl_secs: std::env::var("EXAM_CACHE_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.exam_cache_ttl_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            warn_file: std::env::var("WARN_FILE").unwrap_or(default.warn_file),
            delete_imported_files: std::env::var("DELETE_IMPORTED_FILES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.delete_imported_files),
        }
    }

    pub fn bulk_item_delay(&self) -> Duration {
        Duration::from_millis(self.bulk_item_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn exam_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.exam_cache_ttl_secs)
    }
}
