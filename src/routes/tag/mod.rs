mod handler;

pub use handler::{create, delete, get, list_all, post_tags, update};
