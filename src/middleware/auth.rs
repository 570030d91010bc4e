use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::app::AppState;
use crate::auth::decode_jwt;
use crate::error::ApiError;
use crate::tenancy::Identity;

/// Loads the requester's identity from a bearer token.
///
/// Requests without `Authorization` continue anonymously. A malformed or invalid
/// token is rejected with 401. A token for a user that no longer exists is treated
/// as anonymous.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_jwt_from_headers(request.headers()).map_err(ApiError::unauthorized)?
    else {
        return Ok(next.run(request).await);
    };

    let claims = decode_jwt(&token, &state.config.security.jwt_secret)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    match Identity::load(state.users.as_ref(), state.roles.as_ref(), claims.sub, claims.sid).await? {
        Some(identity) => {
            request.extensions_mut().insert(identity);
        }
        None => debug!("Token subject {} no longer exists, continuing unauthenticated", claims.sub),
    }

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header; `Ok(None)` when the header is absent
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
