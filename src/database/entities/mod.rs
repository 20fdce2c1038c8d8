/// 数据库行实体
/// 与表结构一一对应，转换为领域模型时校验枚举列
pub mod category;
pub mod comment;
pub mod post;
pub mod tag;
pub mod user;

use crate::database::error::RepoError;
use crate::models::Id;

pub use category::CategoryRow;
pub use comment::CommentRow;
pub use post::{PostRow, PostTagRow};
pub use tag::TagRow;
pub use user::UserRow;

/// BIGSERIAL 主键转换为领域ID
pub(crate) fn to_id(value: i64) -> Result<Id, RepoError> {
    Id::try_from(value).map_err(|_| RepoError::from_persistence(format!("negative id {value}")))
}

/// 领域ID转换为数据库主键
pub(crate) fn to_db_id(id: Id) -> Result<i64, RepoError> {
    i64::try_from(id).map_err(|_| RepoError::InvalidInput(format!("id {id} out of range")))
}

/// 解析文本枚举列
pub(crate) fn parse_column<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, RepoError> {
    value.parse().map_err(RepoError::Persistence)
}
