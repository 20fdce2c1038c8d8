use thiserror::Error;

use crate::cache::CacheError;
use crate::database::RepoError;

/// 服务层错误
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("{field} already exists")]
    Duplicate { field: String },
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("password hashing failed: {0}")]
    Password(#[from] bcrypt::BcryptError),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::Duplicate {
            field: field.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => ServiceError::Duplicate { field: constraint },
            RepoError::InvalidInput(msg) | RepoError::Integrity(msg) => {
                ServiceError::InvalidInput(msg)
            }
            other => ServiceError::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// 将按ID查询的 `NotFound` 转换为带实体名的服务错误
pub(crate) trait OrMissing<T> {
    fn or_missing(self, entity: &'static str) -> ServiceResult<T>;
}

impl<T> OrMissing<T> for Result<T, RepoError> {
    fn or_missing(self, entity: &'static str) -> ServiceResult<T> {
        self.map_err(|err| match err {
            RepoError::NotFound => ServiceError::not_found(entity),
            other => other.into(),
        })
    }
}
