use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::AppState;

/// Login route unauthenticated requests are redirected to
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// 302 to the login route, for anonymous principals attempting a mutation
pub fn login_redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, LOGIN_PATH)]).into_response()
}

/// Authentication middleware for routes that require a principal.
/// Anonymous or stale-token requests are redirected to login.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match authenticate(&state, request.headers()).await? {
        Some(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => Ok(login_redirect()),
    }
}

/// Authentication middleware for routes that work with or without a
/// principal. A valid token populates CurrentUser; anything else passes
/// through anonymously.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(user) = authenticate(&state, request.headers()).await? {
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Option<CurrentUser>, AppError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Ok(None),
    };

    let claims = match AuthService::validate_token(token, &state.config) {
        Ok(claims) => claims,
        Err(_) => return Ok(None),
    };

    // The token may outlive the account
    let username: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(state.db.pool())
        .await?;

    Ok(username.map(|(username,)| CurrentUser {
        id: claims.sub,
        username,
    }))
}
