//! Authentication middleware for protected endpoints.
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! verified [`PlayerRef`] into request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use poker_lobby::auth::PlayerRef;
//!
//! async fn protected_handler(Extension(player): Extension<PlayerRef>) -> String {
//!     format!("Authenticated as {}", player)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::logging::log_security_event;

/// Authentication middleware that validates JWT tokens and injects the player.
///
/// Missing header, wrong scheme, and invalid or expired tokens all yield
/// `401 Unauthorized`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.verifier.verify(token) {
        Ok(player) => {
            request.extensions_mut().insert(player);
            Ok(next.run(request).await)
        }
        Err(e) => {
            log_security_event("invalid_token", None, request.uri().path(), &e.to_string());
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
