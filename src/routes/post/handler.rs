use axum::extract::{Extension, Json, Path, Query, State};

use crate::{
    AppState,
    models::{Id, Page, Post},
    routes::{ApiResult, PageQuery, require_owner},
    utils::{Claims, success_to_api_response},
};

use super::model::{CreatePostRequest, PostListQuery, UpdatePostRequest};

#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> ApiResult<Page<Post>> {
    let page = query.page().to_request(&state.config.service);
    let posts = state.services.posts.list(query.conditions(), page).await?;
    Ok(success_to_api_response(posts))
}

/// 阅读文章，同时计一次浏览
#[axum::debug_handler]
pub async fn view(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Post> {
    let post = state.services.posts.view(id).await?;
    Ok(success_to_api_response(post))
}

#[axum::debug_handler]
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Post>> {
    let page = query.to_request(&state.config.service);
    let posts = state.services.posts.list_by_category(id, page).await?;
    Ok(success_to_api_response(posts))
}

#[axum::debug_handler]
pub async fn list_by_tag(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Post>> {
    let page = query.to_request(&state.config.service);
    let posts = state.services.posts.list_by_tag(id, page).await?;
    Ok(success_to_api_response(posts))
}

#[axum::debug_handler]
pub async fn list_by_user(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Post>> {
    let page = query.to_request(&state.config.service);
    let posts = state.services.posts.list_by_user(id, page).await?;
    Ok(success_to_api_response(posts))
}

#[axum::debug_handler]
pub async fn create(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<Post> {
    let mut new = req.post;
    new.user_id = claims.sub;
    let post = state.services.posts.create(new, &req.tags).await?;
    Ok(success_to_api_response(post))
}

/// 作者或管理员可修改
#[axum::debug_handler]
pub async fn update(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Post> {
    let existing = state.services.posts.get(id).await?;
    require_owner(&claims, existing.user_id)?;

    let post = state
        .services
        .posts
        .update(id, req.changes, req.tags)
        .await?;
    Ok(success_to_api_response(post))
}

#[axum::debug_handler]
pub async fn delete(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<()> {
    let existing = state.services.posts.get(id).await?;
    require_owner(&claims, existing.user_id)?;

    state.services.posts.delete(id).await?;
    Ok(success_to_api_response(()))
}
