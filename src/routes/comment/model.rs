use serde::Deserialize;

use crate::models::{Id, NewComment};

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: Id,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Id>,
}

impl CreateCommentRequest {
    /// 评论者为当前登录用户
    pub fn into_new(self, user_id: Id) -> NewComment {
        NewComment {
            content: self.content,
            post_id: self.post_id,
            user_id,
            parent_id: self.parent_id,
        }
    }
}
