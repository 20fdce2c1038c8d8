// 缓存模块
// 包含缓存后端、键生成与各实体的缓存操作

pub mod backend;
pub mod error;
pub mod keys;
pub mod memory;
pub mod operations;

// 重新导出常用类型，方便其他模块使用
pub use backend::{CacheBackend, RedisCache};
pub use error::CacheError;
pub use memory::MemoryCache;
pub use operations::{CacheEntity, EntityCache};
