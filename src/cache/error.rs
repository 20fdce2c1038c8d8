use thiserror::Error;

/// 缓存层错误，原样交给服务层决定是否致命
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}
