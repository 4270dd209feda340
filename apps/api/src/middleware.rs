use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use muster_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the bearer credential into a caller identity.
///
/// Every protected route receives the identity as a request extension so
/// services can enforce the self-deactivation invariant and attribute
/// audit data to the caller.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("missing bearer credential".to_owned()))?;

    let identity = state.token_authenticator.authenticate(token.as_str()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
