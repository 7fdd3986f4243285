use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 批量导入校验错误（在任何写入之前发现）
    #[error("导入错误: {0}")]
    Import(#[from] ImportError),
    /// 存储层错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 引用的记录不存在
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: &'static str, id: String },
    /// 重试之后仍然失败的写入
    #[error("写入失败 ({operation})，已尝试 {attempts} 次: {source}")]
    WriteFailure {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 批量导入校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// 片段数量不能整除每题的片段数
    #[error("题目格式不正确: 共 {fragment_count} 个片段，每道题需要 {group_size} 个片段")]
    Format {
        fragment_count: usize,
        group_size: usize,
    },
    /// 未选择知识点或分区
    #[error("请先选择{field}，然后重新粘贴")]
    MissingSelection { field: &'static str },
}

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 存储暂时不可用（限流、网络抖动等）
    #[error("存储暂时不可用 ({operation}): {message}")]
    Unavailable { operation: String, message: String },
    /// 记录序列化/反序列化失败
    #[error("记录序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(StoreError::Serialization(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建记录不存在错误
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// 创建存储不可用错误
    pub fn store_unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Store(StoreError::Unavailable {
            operation: operation.into(),
            message: message.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否值得重试
    ///
    /// 校验错误和"记录不存在"重试也不会成功，直接返回给调用方。
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AppError::Import(_) | AppError::NotFound { .. } | AppError::WriteFailure { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
