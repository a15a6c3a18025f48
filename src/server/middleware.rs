use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use super::AppState;
use crate::error::{AppError, Result};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Guards the trigger endpoints with the shared `api.key`.
///
/// With no key configured every request passes, which is only meant for
/// local development. Rejections use the regular JSON error body.
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let Some(expected) = state.settings.api.key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == expected => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!(path = %req.uri().path(), "Trigger rejected: invalid API key");
            Err(AppError::Auth("Invalid API key".to_string()))
        }
        None => {
            tracing::warn!(path = %req.uri().path(), "Trigger rejected: missing API key");
            Err(AppError::Auth(format!("Missing {} header", API_KEY_HEADER)))
        }
    }
}
