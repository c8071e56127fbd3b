use std::net::SocketAddr;
use std::sync::Arc;

use auth::AccessController;
use auth::RoleSet;
use auth::ThrottleDecision;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::inbound::http::router::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Route-level guard state: who checks, and which roles pass.
#[derive(Clone)]
pub struct RoleGuard {
    controller: Arc<AccessController>,
    roles: RoleSet,
}

/// Build the guard for a protected route.
///
/// Pair it with [`enforce_role`] through `axum::middleware::from_fn_with_state`.
pub fn require_role(controller: &Arc<AccessController>, roles: RoleSet) -> RoleGuard {
    RoleGuard {
        controller: Arc::clone(controller),
        roles,
    }
}

/// Middleware that validates the bearer token, checks its role and adds the
/// verified principal to request extensions
pub async fn enforce_role(
    State(guard): State<RoleGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = guard
        .controller
        .authorize(authorization, &guard.roles)
        .map_err(|e| {
            tracing::warn!(error = %e, uri = %req.uri(), "Access rejected");
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Outermost gate: counts every request against its client identity before
/// anything else runs.
pub async fn throttle(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = client_identity(&req, state.trust_forwarded_header);

    match state.throttler.check(&identity) {
        ThrottleDecision::Allowed { .. } => Ok(next.run(req).await),
        ThrottleDecision::Throttled { retry_after } => {
            let limits = state.throttler.config();
            tracing::warn!(
                client = %identity,
                max_requests = limits.max_requests,
                window_secs = limits.window.as_secs(),
                "Request throttled"
            );
            let round_up = u64::from(retry_after.subsec_nanos() > 0);
            Err(ApiError::TooManyRequests {
                retry_after_secs: retry_after.as_secs() + round_up,
            })
        }
    }
}

/// Peer IP, or the first `X-Forwarded-For` hop when the proxy is trusted.
fn client_identity(req: &Request, trust_forwarded_header: bool) -> String {
    if trust_forwarded_header {
        let forwarded = req
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(forwarded) = forwarded {
            return forwarded.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
