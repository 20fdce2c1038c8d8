mod handler;

pub use handler::{create, delete, get, list, update};
