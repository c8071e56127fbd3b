#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::AccessController;
use auth::Authenticator;
use auth::HashingCost;
use auth::PasswordHasher;
use auth::RequestThrottler;
use auth::ThrottleConfig;
use auth::TokenCodec;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use http_body_util::BodyExt;
use identity_service::domain::user::service::UserService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryUserRepository;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const DEFAULT_CLIENT: &str = "198.51.100.7:40000";

pub struct TestOptions {
    pub enforce_unique_email: bool,
    pub throttle: ThrottleConfig,
    pub trust_forwarded_header: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            enforce_unique_email: true,
            throttle: ThrottleConfig::default(),
            trust_forwarded_header: false,
        }
    }
}

/// Router wired to an in-memory store, driven without a socket
pub struct TestApp {
    pub router: Router,
    pub repository: InMemoryUserRepository,
    pub token_codec: TokenCodec,
}

/// Response status, headers and JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_options(TestOptions::default())
    }

    pub fn with_options(options: TestOptions) -> Self {
        let token_codec = TokenCodec::new(JWT_SECRET);

        // Cheap cost keeps the suite fast; verification reads the cost from the hash
        let password_hasher = PasswordHasher::with_cost(HashingCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to build password hasher");

        let authenticator = Arc::new(Authenticator::new(password_hasher, token_codec.clone()));
        let repository = InMemoryUserRepository::new(options.enforce_unique_email);

        let user_service = Arc::new(UserService::new(
            Arc::new(repository.clone()),
            authenticator,
            chrono::Duration::hours(1),
        ));

        let router = create_router(
            user_service,
            Arc::new(AccessController::new(token_codec.clone())),
            Arc::new(RequestThrottler::new(options.throttle)),
            options.trust_forwarded_header,
        );

        Self {
            router,
            repository,
            token_codec,
        }
    }

    /// Send a request as if it came from `DEFAULT_CLIENT`
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        self.send_from(DEFAULT_CLIENT, request).await
    }

    /// Send a request from a specific peer address
    pub async fn send_from(&self, peer: &str, mut request: Request<Body>) -> TestResponse {
        let peer: SocketAddr = peer.parse().expect("Invalid peer address");
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Build a POST request with a JSON body
    pub fn post_json(path: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request")
    }

    /// Build a GET request, optionally with a bearer token
    pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).expect("Failed to build request")
    }

    pub async fn register(&self, name: &str, email: &str, password: &str, role: Option<&str>) -> TestResponse {
        let mut body = json!({
            "name": name,
            "email": email,
            "password": password,
        });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.send(Self::post_json("/register", &body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send(Self::post_json(
            "/login",
            &json!({ "email": email, "password": password }),
        ))
        .await
    }

    /// Register then log in, returning the issued token
    pub async fn token_for(&self, email: &str, role: &str) -> String {
        let registered = self.register("Test User", email, "pass_word!", Some(role)).await;
        assert_eq!(registered.status, StatusCode::OK);

        let response = self.login(email, "pass_word!").await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }
}

pub fn small_throttle(max_requests: u32) -> ThrottleConfig {
    ThrottleConfig {
        window: Duration::from_secs(15 * 60),
        max_requests,
    }
}
