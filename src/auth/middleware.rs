//! Request gatekeeping: bearer-token authentication and admin checks.
//!
//! [`require_auth`] validates the `Authorization: Bearer <token>` header and
//! stores the resulting [`AuthUser`] in the request extensions.
//! [`require_admin`] must run after it. Handlers read the identity with the
//! [`AuthUser`] extractor.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::domain::{Role, UserId};
use crate::error::TaskboardError;

/// Identity of the caller, taken from a validated session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Authenticated user id.
    pub user_id: UserId,
    /// Username at token issue time.
    pub username: String,
    /// Role at token issue time.
    pub role: Role,
}

impl AuthUser {
    /// Returns `true` if the caller is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Rejects requests without a valid bearer token.
///
/// # Errors
///
/// Returns [`TaskboardError::Unauthorized`] if the header is missing,
/// malformed, or carries an invalid or expired token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, TaskboardError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| TaskboardError::Unauthorized("missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            TaskboardError::Unauthorized("expected a bearer token".to_string())
        })?;

    let claims = state.tokens.validate(token).inspect_err(|err| {
        tracing::debug!(error = %err, "rejected session token");
    })?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        username: claims.username,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Rejects authenticated callers that are not administrators.
///
/// # Errors
///
/// Returns [`TaskboardError::Unauthorized`] if [`require_auth`] did not run
/// first, or [`TaskboardError::Forbidden`] for non-admin callers.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, TaskboardError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| TaskboardError::Unauthorized("not authenticated".to_string()))?;

    if !user.is_admin() {
        tracing::warn!(user_id = %user.user_id, path = %request.uri().path(), "admin route denied");
        return Err(TaskboardError::Forbidden("admin rights required".to_string()));
    }

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = TaskboardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| TaskboardError::Unauthorized("not authenticated".to_string()))
    }
}
