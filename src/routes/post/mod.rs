mod handler;
mod model;

pub use handler::{create, delete, list, list_by_category, list_by_tag, list_by_user, update, view};
pub use model::{CreatePostRequest, PostListQuery, UpdatePostRequest};
