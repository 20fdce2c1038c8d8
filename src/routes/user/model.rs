use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Id, Role, UpdateUser, User, UserStatus};

/// 对外展示的用户资料，不含密码哈希
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub avatar: String,
    pub bio: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            nickname: user.nickname,
            avatar: user.avatar,
            bio: user.bio,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: i64,
}

/// 用户自行修改资料，角色与状态只能由管理员修改
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUser {
    fn from(req: UpdateProfileRequest) -> Self {
        UpdateUser {
            email: req.email,
            nickname: req.nickname,
            avatar: req.avatar,
            bio: req.bio,
            ..UpdateUser::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}
