/// 目录操作错误
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// 参数缺失或为空，在访问缓存和存储之前检查
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("message user not found: {0}")]
    NotFound(String),

    #[error("message user already exists: {0}")]
    AlreadyExists(String),

    /// 存储层错误，原样向上传递
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DirectoryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// 持久化存储错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 数据库中的行无法解析为用户记录
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    #[inline]
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
