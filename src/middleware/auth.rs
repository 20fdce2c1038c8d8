use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, error::AppError, utils::verify_token};

/// 校验 `Authorization: Bearer` 令牌，并与缓存中的当前会话令牌比对
///
/// 通过后把 `Claims` 放入请求扩展，供 handler 通过 `Extension<Claims>` 取用。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::Unauthorized)?;
    let token = bearer.token();

    let claims = verify_token(token, &state.config.service.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Unauthorized
    })?;

    // 登出或修改密码后缓存中的令牌会被删除，旧令牌随即失效
    let current = state.services.users.current_token(claims.sub).await?;
    if current.as_deref() != Some(token) {
        tracing::debug!("Token of user {} is no longer the active session", claims.sub);
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
