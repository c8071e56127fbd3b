use std::sync::Arc;
use std::time::Duration;

use auth::AccessController;
use auth::RequestThrottler;
use auth::Role;
use auth::RoleSet;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::admin_dashboard;
use super::handlers::current_user;
use super::handlers::login;
use super::handlers::register;
use super::middleware::enforce_role;
use super::middleware::require_role;
use super::middleware::throttle;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub access_controller: Arc<AccessController>,
    pub throttler: Arc<RequestThrottler>,
    pub trust_forwarded_header: bool,
}

pub fn create_router(
    user_service: Arc<dyn UserServicePort>,
    access_controller: Arc<AccessController>,
    throttler: Arc<RequestThrottler>,
    trust_forwarded_header: bool,
) -> Router {
    let state = AppState {
        user_service,
        access_controller,
        throttler,
        trust_forwarded_header,
    };

    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let admin_routes = Router::new()
        .route("/admin", get(admin_dashboard))
        .route_layer(middleware::from_fn_with_state(
            require_role(&state.access_controller, RoleSet::only(Role::Admin)),
            enforce_role,
        ));

    let member_routes = Router::new()
        .route("/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            require_role(&state.access_controller, RoleSet::all()),
            enforce_role,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(member_routes)
        .layer(middleware::from_fn_with_state(state.clone(), throttle))
        .layer(trace_layer)
        .with_state(state)
}
