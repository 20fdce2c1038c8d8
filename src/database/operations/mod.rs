// Postgres 存储实现
pub mod category;
pub mod comment;
pub mod post;
pub mod tag;
pub mod user;

pub use category::CategoryOperation;
pub use comment::CommentOperation;
pub use post::PostOperation;
pub use tag::TagOperation;
pub use user::UserOperation;
