use axum::extract::{Extension, Json, Path, State};

use crate::{
    AppState,
    models::{Id, NewTag, Tag, UpdateTag},
    routes::{ApiResult, require_admin},
    utils::{Claims, success_to_api_response},
};

#[axum::debug_handler]
pub async fn list_all(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    let tags = state.services.tags.list_all().await?;
    Ok(success_to_api_response(tags))
}

#[axum::debug_handler]
pub async fn get(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Tag> {
    let tag = state.services.tags.get(id).await?;
    Ok(success_to_api_response(tag))
}

/// 文章的标签
#[axum::debug_handler]
pub async fn post_tags(State(state): State<AppState>, Path(post_id): Path<Id>) -> ApiResult<Vec<Tag>> {
    let tags = state.services.tags.post_tags(post_id).await?;
    Ok(success_to_api_response(tags))
}

#[axum::debug_handler]
pub async fn create(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<NewTag>,
) -> ApiResult<Tag> {
    require_admin(&claims)?;
    let tag = state.services.tags.create(req).await?;
    Ok(success_to_api_response(tag))
}

#[axum::debug_handler]
pub async fn update(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<UpdateTag>,
) -> ApiResult<Tag> {
    require_admin(&claims)?;
    let tag = state.services.tags.update(id, req).await?;
    Ok(success_to_api_response(tag))
}

#[axum::debug_handler]
pub async fn delete(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<()> {
    require_admin(&claims)?;
    state.services.tags.delete(id).await?;
    Ok(success_to_api_response(()))
}
