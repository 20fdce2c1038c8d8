use crate::cache::error::CacheError;
use crate::cache::operations::entity::EntityCache;
use crate::models::{Id, Post};

/// 浏览量计数器键前缀，计数器不设过期时间
const POST_VIEW_PREFIX: &str = "post:view:";

/// 生成文章浏览量计数器键
pub fn view_count_key(post_id: Id) -> String {
    format!("{POST_VIEW_PREFIX}{post_id}")
}

impl EntityCache<Post> {
    /// 浏览量原子加一，返回累计值
    pub async fn incr_view_count(&self, post_id: Id) -> Result<u64, CacheError> {
        let count = self.backend().incr(&view_count_key(post_id)).await?;
        Ok(count.max(0) as u64)
    }

    /// 读取累计浏览量，计数器不存在时为0
    pub async fn view_count(&self, post_id: Id) -> Result<u64, CacheError> {
        let count = self.backend().get(&view_count_key(post_id)).await?;
        Ok(count.and_then(|c| c.parse::<u64>().ok()).unwrap_or(0))
    }

    /// 删除浏览量计数器
    pub async fn delete_view_count(&self, post_id: Id) -> Result<(), CacheError> {
        self.backend().del(&[view_count_key(post_id)]).await
    }
}
