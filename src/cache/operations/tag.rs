use crate::cache::error::CacheError;
use crate::cache::keys;
use crate::cache::operations::entity::EntityCache;
use crate::cache::CacheEntity;
use crate::models::{Id, Tag};

impl EntityCache<Tag> {
    /// 全部标签列表的缓存键
    pub fn all_key(&self) -> String {
        keys::list_key(Tag::PREFIX, "all")
    }

    /// 某篇文章的标签列表缓存键
    pub fn post_tags_key(&self, post_id: Id) -> String {
        self.scoped_key("post", post_id, &[])
    }

    /// 缓存文章的标签列表
    pub async fn set_post_tags(&self, post_id: Id, tags: &[Tag]) -> Result<(), CacheError> {
        let key = self.post_tags_key(post_id);
        self.put_json(&key, tags, self.ttl()).await
    }

    /// 获取文章的标签列表，未命中返回 `None`
    pub async fn get_post_tags(&self, post_id: Id) -> Result<Option<Vec<Tag>>, CacheError> {
        self.get_json(&self.post_tags_key(post_id)).await
    }

    /// 删除文章的标签列表缓存
    pub async fn delete_post_tags(&self, post_id: Id) -> Result<(), CacheError> {
        self.backend().del(&[self.post_tags_key(post_id)]).await
    }
}
