//! Bearer authentication middleware for the REST bid routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::error::GatewayError;

/// Rejects the request unless it carries a valid `Authorization: Bearer`
/// header. The verified principal is inserted into request extensions for
/// downstream handlers.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] on a missing, malformed, or
/// invalid credential.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| GatewayError::Unauthorized("authorization header is not provided".to_string()))?;

    let mut fields = header.split_whitespace();
    let scheme = fields
        .next()
        .ok_or_else(|| GatewayError::Unauthorized("invalid authorization header".to_string()))?;
    let token = fields
        .next()
        .ok_or_else(|| GatewayError::Unauthorized("invalid authorization header".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GatewayError::Unauthorized(format!(
            "unsupported authorization type {scheme}"
        )));
    }

    let payload = state.verifier.verify(token)?;
    req.extensions_mut().insert(payload);

    Ok(next.run(req).await)
}
