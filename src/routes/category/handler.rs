use axum::extract::{Extension, Json, Path, Query, State};

use crate::{
    AppState,
    models::{Category, Id, NewCategory, Page, UpdateCategory},
    routes::{ApiResult, PageQuery, require_admin},
    utils::{Claims, success_to_api_response},
};

#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Category>> {
    let page = query.to_request(&state.config.service);
    let categories = state.services.categories.list(page).await?;
    Ok(success_to_api_response(categories))
}

#[axum::debug_handler]
pub async fn get(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Category> {
    let category = state.services.categories.get(id).await?;
    Ok(success_to_api_response(category))
}

#[axum::debug_handler]
pub async fn create(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<NewCategory>,
) -> ApiResult<Category> {
    require_admin(&claims)?;
    let category = state.services.categories.create(req).await?;
    Ok(success_to_api_response(category))
}

#[axum::debug_handler]
pub async fn update(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<UpdateCategory>,
) -> ApiResult<Category> {
    require_admin(&claims)?;
    let category = state.services.categories.update(id, req).await?;
    Ok(success_to_api_response(category))
}

#[axum::debug_handler]
pub async fn delete(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<()> {
    require_admin(&claims)?;
    state.services.categories.delete(id).await?;
    Ok(success_to_api_response(()))
}
