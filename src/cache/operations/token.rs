use std::time::Duration;

use crate::cache::error::CacheError;
use crate::cache::operations::entity::EntityCache;
use crate::models::{Id, User};

/// 用户当前会话令牌键前缀
const USER_TOKEN_PREFIX: &str = "user:token:";

/// 生成用户令牌缓存键
pub fn user_token_key(user_id: Id) -> String {
    format!("{USER_TOKEN_PREFIX}{user_id}")
}

impl EntityCache<User> {
    /// 缓存用户当前令牌，新登录会覆盖旧令牌
    pub async fn set_token(&self, user_id: Id, token: &str, ttl: Duration) -> Result<(), CacheError> {
        self.backend()
            .set_ex(&user_token_key(user_id), token, ttl)
            .await
    }

    /// 获取用户当前令牌
    pub async fn get_token(&self, user_id: Id) -> Result<Option<String>, CacheError> {
        self.backend().get(&user_token_key(user_id)).await
    }

    /// 删除用户令牌
    pub async fn delete_token(&self, user_id: Id) -> Result<(), CacheError> {
        self.backend().del(&[user_token_key(user_id)]).await
    }
}
