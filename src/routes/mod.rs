pub mod category;
pub mod comment;
pub mod post;
pub mod tag;
pub mod user;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::{
    AppState,
    config::ServiceSettings,
    error::AppError,
    middleware::{auth_middleware, log_errors},
    models::{Id, PageRequest},
    result::ApiResponse,
    utils::Claims,
};

/// 所有接口挂载的前缀
pub const API_BASE: &str = "/api";

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// 分页查询参数，缺省时使用配置中的默认值
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn to_request(&self, settings: &ServiceSettings) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(settings.default_page_size),
        )
    }
}

pub(crate) fn require_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// 资源所有者或管理员
pub(crate) fn require_owner(claims: &Claims, owner_id: Id) -> Result<(), AppError> {
    if claims.sub == owner_id || claims.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// 组装全部路由，公开路由与需要认证的路由分开挂载
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        // 用户
        .route("/users/register", post(user::register))
        .route("/users/login", post(user::login))
        .route("/users/{id}", get(user::get_user))
        .route("/users/{id}/posts", get(post::list_by_user))
        .route("/users/{id}/comments", get(comment::list_by_user))
        // 分类与标签
        .route("/categories", get(category::list))
        .route("/categories/{id}", get(category::get))
        .route("/categories/{id}/posts", get(post::list_by_category))
        .route("/tags", get(tag::list_all))
        .route("/tags/{id}", get(tag::get))
        .route("/tags/{id}/posts", get(post::list_by_tag))
        // 文章与评论
        .route("/posts", get(post::list))
        .route("/posts/{id}", get(post::view))
        .route("/posts/{id}/tags", get(tag::post_tags))
        .route("/posts/{id}/comments", get(comment::list_by_post))
        .route("/comments/{id}", get(comment::get));

    let protected_routes = Router::new()
        .route("/users", get(user::list_users))
        .route("/users/me", get(user::me).put(user::update_me))
        .route("/users/logout", post(user::logout))
        .route("/users/password", put(user::change_password))
        .route("/users/{id}", put(user::update_user).delete(user::delete_user))
        .route("/categories", post(category::create))
        .route("/categories/{id}", put(category::update).delete(category::delete))
        .route("/tags", post(tag::create))
        .route("/tags/{id}", put(tag::update).delete(tag::delete))
        .route("/posts", post(post::create))
        .route("/posts/{id}", put(post::update).delete(post::delete))
        .route("/comments", post(comment::create))
        .route("/comments/{id}", put(comment::update).delete(comment::delete))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .nest(API_BASE, public_routes.merge(protected_routes))
        .layer(axum::middleware::from_fn(log_errors));

    // 开发模式下允许所有来源跨域
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
