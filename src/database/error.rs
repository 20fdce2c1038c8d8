use thiserror::Error;

/// 存储层错误
///
/// `NotFound` 与其他错误严格区分，调用方据此判断“不存在”与“暂时失败”。
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("integrity error: {0}")]
    Integrity(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound)
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Duplicate {
                constraint: db.constraint().unwrap_or("unique").to_string(),
            },
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepoError::Integrity(db.message().to_string())
            }
            other => RepoError::from_persistence(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(RepoError::from(sqlx::Error::RowNotFound).is_not_found());
    }

    #[test]
    fn other_sqlx_errors_are_persistence_failures() {
        let err = RepoError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepoError::Persistence(_)));
    }
}
