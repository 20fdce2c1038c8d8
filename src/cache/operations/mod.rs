/// 缓存操作
/// 通用实体缓存及各实体的附加缓存

pub mod entity;

// 评论列表索引
pub mod comment;

// 文章浏览量计数
pub mod post;

// 文章标签列表
pub mod tag;

// 用户会话令牌
pub mod token;

pub use entity::{CacheEntity, EntityCache};
