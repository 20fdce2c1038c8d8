/// 领域模型
/// 缓存与数据库共用的实体定义
pub mod category;
pub mod comment;
pub mod condition;
pub mod page;
pub mod post;
pub mod tag;
pub mod user;

/// 实体ID，在各自实体内唯一
pub type Id = u64;

pub use category::{Category, NewCategory, UpdateCategory};
pub use comment::{Comment, CommentStatus, NewComment, UpdateComment};
pub use condition::{Conditions, Scalar};
pub use page::{Page, PageRequest};
pub use post::{NewPost, Post, PostStatus, UpdatePost};
pub use tag::{NewTag, Tag, UpdateTag};
pub use user::{NewUser, Role, UpdateUser, User, UserStatus};
