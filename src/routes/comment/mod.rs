mod handler;
mod model;

pub use handler::{create, delete, get, list_by_post, list_by_user, update};
pub use model::CreateCommentRequest;
