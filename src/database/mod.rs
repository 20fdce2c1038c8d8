// 数据库模块
// 包含存储接口、行实体、Postgres 与内存两种实现

pub mod entities; // 数据库行实体
pub mod error;
pub mod memory;
pub mod operations; // Postgres 操作实现
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use error::RepoError;
pub use memory::MemoryStore;
pub use operations::{CategoryOperation, CommentOperation, PostOperation, TagOperation, UserOperation};
pub use store::{CategoryStore, CommentStore, PostStore, TagStore, UserStore};
