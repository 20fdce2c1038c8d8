use axum::extract::{Extension, Json, Path, Query, State};

use crate::{
    AppState,
    error::AppError,
    models::{Comment, Id, Page, UpdateComment},
    routes::{ApiResult, PageQuery, require_owner},
    utils::{Claims, success_to_api_response},
};

use super::model::CreateCommentRequest;

#[axum::debug_handler]
pub async fn get(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Comment> {
    let comment = state.services.comments.get(id).await?;
    Ok(success_to_api_response(comment))
}

#[axum::debug_handler]
pub async fn list_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<Id>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Comment>> {
    let page = query.to_request(&state.config.service);
    let comments = state.services.comments.list_by_post(post_id, page).await?;
    Ok(success_to_api_response(comments))
}

#[axum::debug_handler]
pub async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Id>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Comment>> {
    let page = query.to_request(&state.config.service);
    let comments = state.services.comments.list_by_user(user_id, page).await?;
    Ok(success_to_api_response(comments))
}

#[axum::debug_handler]
pub async fn create(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Comment> {
    let comment = state
        .services
        .comments
        .create(req.into_new(claims.sub))
        .await?;
    Ok(success_to_api_response(comment))
}

/// 评论者本人可修改内容，审核状态只能由管理员修改
#[axum::debug_handler]
pub async fn update(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<UpdateComment>,
) -> ApiResult<Comment> {
    let existing = state.services.comments.get(id).await?;
    require_owner(&claims, existing.user_id)?;
    if req.status.is_some() && !claims.is_admin() {
        return Err(AppError::Forbidden);
    }

    let comment = state.services.comments.update(id, req).await?;
    Ok(success_to_api_response(comment))
}

#[axum::debug_handler]
pub async fn delete(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<()> {
    let existing = state.services.comments.get(id).await?;
    require_owner(&claims, existing.user_id)?;

    state.services.comments.delete(id).await?;
    Ok(success_to_api_response(()))
}
