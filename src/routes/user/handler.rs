use axum::extract::{Extension, Json, Path, Query, State};

use crate::{
    AppState,
    models::{Id, NewUser, Page, UpdateUser},
    routes::{ApiResult, PageQuery, require_admin, require_owner},
    utils::{Claims, success_to_api_response},
};

use super::model::{
    ChangePasswordRequest, LoginRequest, LoginResponse, UpdateProfileRequest, UserProfile,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> ApiResult<UserProfile> {
    let user = state.services.users.register(req).await?;
    Ok(success_to_api_response(user.into()))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let outcome = state
        .services
        .users
        .login(&req.username, &req.password)
        .await?;
    Ok(success_to_api_response(LoginResponse {
        user: outcome.user.into(),
        token: outcome.token,
        expires_at: outcome.expires_at,
    }))
}

#[axum::debug_handler]
pub async fn logout(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> ApiResult<()> {
    state.services.users.logout(claims.sub).await?;
    Ok(success_to_api_response(()))
}

/// 当前登录用户
#[axum::debug_handler]
pub async fn me(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> ApiResult<UserProfile> {
    let user = state.services.users.get_user(claims.sub).await?;
    Ok(success_to_api_response(user.into()))
}

#[axum::debug_handler]
pub async fn update_me(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    let user = state
        .services
        .users
        .update_user(claims.sub, req.into())
        .await?;
    Ok(success_to_api_response(user.into()))
}

#[axum::debug_handler]
pub async fn change_password(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    state
        .services
        .users
        .change_password(claims.sub, &req.old_password, &req.new_password)
        .await?;
    Ok(success_to_api_response(()))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<UserProfile> {
    let user = state.services.users.get_user(id).await?;
    Ok(success_to_api_response(user.into()))
}

/// 用户列表，仅管理员
#[axum::debug_handler]
pub async fn list_users(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<UserProfile>> {
    require_admin(&claims)?;
    let page = query.to_request(&state.config.service);
    let users = state.services.users.list_users(page).await?;
    Ok(success_to_api_response(users.map(UserProfile::from)))
}

/// 管理员修改任意用户，包括角色与状态
#[axum::debug_handler]
pub async fn update_user(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<UpdateUser>,
) -> ApiResult<UserProfile> {
    require_admin(&claims)?;
    let user = state.services.users.update_user(id, req).await?;
    Ok(success_to_api_response(user.into()))
}

#[axum::debug_handler]
pub async fn delete_user(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<()> {
    require_owner(&claims, id)?;
    state.services.users.delete_user(id).await?;
    Ok(success_to_api_response(()))
}
