use std::net::SocketAddr;
use std::sync::Arc;

use auth::AccessController;
use auth::Authenticator;
use auth::PasswordHasher;
use auth::RequestThrottler;
use auth::TokenCodec;
use identity_service::config::Config;
use identity_service::domain::user::ports::UserServicePort;
use identity_service::domain::user::service::UserService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_DB_CONNECTIONS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        in_memory_store = config.database.is_in_memory(),
        token_ttl_seconds = config.jwt.ttl_seconds,
        throttle_window_seconds = config.throttle.window_seconds,
        throttle_max_requests = config.throttle.max_requests,
        trust_forwarded_header = config.throttle.trust_forwarded_header,
        enforce_unique_email = config.users.enforce_unique_email,
        "Configuration loaded"
    );
    if config.jwt.secret.len() < 32 {
        tracing::warn!("jwt.secret is shorter than 32 bytes; HS256 expects at least 256 bits");
    }

    let token_codec = TokenCodec::new(config.jwt.secret.as_bytes());
    let password_hasher = PasswordHasher::with_cost(config.password.cost())?;
    let authenticator = Arc::new(Authenticator::new(password_hasher, token_codec.clone()));
    let access_controller = Arc::new(AccessController::new(token_codec));
    let throttler = Arc::new(RequestThrottler::new(config.throttle.throttle_config()));

    let enforce_unique_email = config.users.enforce_unique_email;
    let user_service: Arc<dyn UserServicePort> = if config.database.is_in_memory() {
        tracing::warn!("Using in-memory credential store; users are lost on restart");
        let user_repository = Arc::new(InMemoryUserRepository::new(enforce_unique_email));
        Arc::new(UserService::new(
            user_repository,
            Arc::clone(&authenticator),
            config.jwt.ttl(),
        ))
    } else {
        let pg_pool = PgPoolOptions::new()
            .max_connections(MAX_DB_CONNECTIONS)
            .connect(&config.database.url)
            .await?;
        tracing::info!(
            max_connections = MAX_DB_CONNECTIONS,
            database = "postgresql",
            "Database connection pool created"
        );

        sqlx::migrate!("./migrations").run(&pg_pool).await?;
        tracing::info!(database = "postgresql", "Database migrations completed");

        let user_repository = Arc::new(PostgresUserRepository::new(pg_pool, enforce_unique_email));
        Arc::new(UserService::new(
            user_repository,
            Arc::clone(&authenticator),
            config.jwt.ttl(),
        ))
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        user_service,
        access_controller,
        throttler,
        config.throttle.trust_forwarded_header,
    );

    axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    tracing::info!("Server exited");

    Ok(())
}
