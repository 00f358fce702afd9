use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::future::Future;
use std::sync::Arc;

use crate::{
    auth::AuthError,
    models::UserRecord,
    AppError, AppState,
};

/// Caller identity for handlers that require sign-in.
///
/// Resolution is explicit: verify the bearer token, then reconcile the
/// verified subject to its local record (creating it on first sight).
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: UserRecord,
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let authorization = match parts.headers.get(header::AUTHORIZATION) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .map(|v| Some(v.to_string()))
                .map_err(|_| AuthError::MalformedHeader),
        };

        let state = state.clone();

        async move {
            let claims = state
                .verifier
                .verify(authorization?.as_deref())
                .await
                .inspect_err(|e| tracing::debug!(error = %e, "Bearer token rejected"))?;

            let user = state.reconciler.reconcile(&claims).await.inspect_err(|e| {
                tracing::debug!(error = %e, subject = claims.subject(), "Identity reconciliation failed")
            })?;

            tracing::debug!(
                subject = claims.subject(),
                user_id = user.id,
                expires_at = %claims.expires_at(),
                "Request authenticated"
            );

            Ok(AuthenticatedUser { user })
        }
    }
}
