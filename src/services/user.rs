use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use super::error::{OrMissing, ServiceError, ServiceResult};
use super::{check_page, ensure_unique, first_failure, list_through, read_through, require_text};
use crate::cache::EntityCache;
use crate::config::ServiceSettings;
use crate::database::{RepoError, UserStore};
use crate::models::{
    Conditions, Id, NewUser, Page, PageRequest, Role, UpdateUser, User, UserStatus,
};
use crate::utils::{generate_token, hash_password, verify_password};

/// 登录结果
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
    pub expires_at: i64,
}

/// 用户服务
pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: EntityCache<User>,
    token_ttl: Duration,
    settings: Arc<ServiceSettings>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: EntityCache<User>,
        token_ttl: Duration,
        settings: Arc<ServiceSettings>,
    ) -> Self {
        Self {
            store,
            cache,
            token_ttl,
            settings,
        }
    }

    /// 注册新用户，用户名与邮箱必须唯一
    pub async fn register(&self, new: NewUser) -> ServiceResult<User> {
        require_text("username", &new.username)?;
        require_text("password", &new.password)?;
        require_text("email", &new.email)?;

        ensure_unique("username", None, self.store.find_by_username(&new.username)).await?;
        ensure_unique("email", None, self.store.find_by_email(&new.email)).await?;

        let now = Utc::now();
        let user = User {
            id: 0,
            password_hash: hash_password(&new.password, self.settings.bcrypt_cost)?,
            nickname: if new.nickname.is_empty() {
                new.username.clone()
            } else {
                new.nickname
            },
            username: new.username,
            email: new.email,
            avatar: new.avatar,
            bio: String::new(),
            role: Role::User,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let user = self.store.create(&user).await?;
        self.cache.set(&user).await?;
        self.cache.invalidate_lists().await?;

        tracing::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// 校验凭据并签发令牌，令牌同时写入缓存作为当前会话
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let user = match self.store.find_by_username(username).await {
            Ok(user) => user,
            Err(RepoError::NotFound) => return Err(ServiceError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };

        if user.status == UserStatus::Disabled {
            return Err(ServiceError::AccountDisabled);
        }
        if !verify_password(password, &user.password_hash)? {
            tracing::debug!("Password mismatch for user {}", user.id);
            return Err(ServiceError::InvalidCredentials);
        }

        let (token, expires_at) =
            generate_token(&user, &self.settings.jwt_secret, self.settings.jwt_ttl)?;
        self.cache.set_token(user.id, &token, self.token_ttl).await?;

        tracing::info!("User {} logged in", user.id);
        Ok(LoginOutcome {
            user,
            token,
            expires_at,
        })
    }

    pub async fn logout(&self, user_id: Id) -> ServiceResult<()> {
        self.cache.delete_token(user_id).await?;
        tracing::info!("User {} logged out", user_id);
        Ok(())
    }

    /// 当前有效的会话令牌
    pub async fn current_token(&self, user_id: Id) -> ServiceResult<Option<String>> {
        Ok(self.cache.get_token(user_id).await?)
    }

    pub async fn get_user(&self, id: Id) -> ServiceResult<User> {
        read_through(&self.cache, id, "user", || self.store.find_by_id(id)).await
    }

    /// 部分更新用户资料；禁用账号会同时使其会话失效
    pub async fn update_user(&self, id: Id, changes: UpdateUser) -> ServiceResult<User> {
        if let Some(username) = &changes.username {
            require_text("username", username)?;
            ensure_unique("username", Some(id), self.store.find_by_username(username)).await?;
        }
        if let Some(email) = &changes.email {
            require_text("email", email)?;
            ensure_unique("email", Some(id), self.store.find_by_email(email)).await?;
        }

        let user = self
            .store
            .update(id, &changes, Utc::now())
            .await
            .or_missing("user")?;
        self.cache.set(&user).await?;
        self.cache.invalidate_lists().await?;
        if changes.status == Some(UserStatus::Disabled) {
            self.cache.delete_token(id).await?;
        }

        tracing::info!("Updated user {}", id);
        Ok(user)
    }

    /// 修改密码，成功后原会话失效
    pub async fn change_password(
        &self,
        id: Id,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        require_text("new password", new_password)?;

        let user = self.store.find_by_id(id).await.or_missing("user")?;
        if !verify_password(old_password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password, self.settings.bcrypt_cost)?;
        let user = self
            .store
            .update_password(id, &password_hash, Utc::now())
            .await
            .or_missing("user")?;
        self.cache.set(&user).await?;
        self.cache.delete_token(id).await?;

        tracing::info!("Changed password for user {}", id);
        Ok(())
    }

    pub async fn delete_user(&self, id: Id) -> ServiceResult<()> {
        self.store.delete(id).await.or_missing("user")?;

        let results = vec![
            self.cache.delete(id).await,
            self.cache.delete_token(id).await,
            self.cache.invalidate_lists().await,
        ];
        tracing::info!("Deleted user {}", id);
        first_failure("user", id, results)
    }

    pub async fn list_users(&self, page: PageRequest) -> ServiceResult<Page<User>> {
        let page = check_page(page, &self.settings)?;
        let key = self.cache.list_key(&Conditions::new(), page);
        let index = self.cache.sentinel();
        list_through(&self.cache, &index, key, || self.store.list(page)).await
    }
}
