mod handler;
mod model;

pub use handler::{
    change_password, delete_user, get_user, list_users, login, logout, me, register, update_me,
    update_user,
};
pub use model::{LoginRequest, LoginResponse, UserProfile};
