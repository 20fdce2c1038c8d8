use crate::cache::error::CacheError;
use crate::cache::operations::entity::EntityCache;
use crate::models::{Comment, Id, PageRequest};

impl EntityCache<Comment> {
    /// 某篇文章评论列表的索引键
    pub fn post_index(&self, post_id: Id) -> String {
        self.scoped_key("post", post_id, &[])
    }

    /// 某个用户评论列表的索引键
    pub fn user_index(&self, user_id: Id) -> String {
        self.scoped_key("user", user_id, &[])
    }

    /// 文章评论分页缓存键
    pub fn post_list_key(&self, post_id: Id, page: PageRequest) -> String {
        self.scoped_key("post", post_id, &[&page.page, &page.page_size])
    }

    /// 用户评论分页缓存键
    pub fn user_list_key(&self, user_id: Id, page: PageRequest) -> String {
        self.scoped_key("user", user_id, &[&page.page, &page.page_size])
    }

    /// 评论变更后清除其所在文章、作者以及全局的列表缓存
    pub async fn invalidate_for(&self, comment: &Comment) -> Result<(), CacheError> {
        self.invalidate_index(&self.post_index(comment.post_id)).await?;
        self.invalidate_index(&self.user_index(comment.user_id)).await?;
        self.invalidate_lists().await
    }
}
