//! Requires a running Postgres reachable through `DATABASE_URL`.
//!
//! Run with `cargo test -p identity-service -- --ignored`.

use auth::Role;
use chrono::Utc;
use identity_service::domain::user::errors::UserError;
use identity_service::domain::user::models::EmailAddress;
use identity_service::domain::user::models::User;
use identity_service::domain::user::models::UserId;
use identity_service::domain::user::models::UserName;
use identity_service::domain::user::ports::UserRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

struct TestDb {
    pool: PgPool,
}

impl TestDb {
    async fn connect() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("Failed to connect to Postgres");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool }
    }

    fn repository(&self, enforce_unique_email: bool) -> PostgresUserRepository {
        PostgresUserRepository::new(self.pool.clone(), enforce_unique_email)
    }
}

fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, UserId::new())
}

fn user(email: &str, role: Role) -> User {
    User {
        id: UserId::new(),
        name: UserName::new("Integration".to_string()).unwrap(),
        email: EmailAddress::new(email.to_string()).unwrap(),
        password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string(),
        role,
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore]
async fn test_create_and_find_by_email() {
    let db = TestDb::connect().await;
    let repo = db.repository(true);
    let email = unique_email("find");

    let created = repo.create(user(&email, Role::Editor)).await.unwrap();
    let found = repo.find_by_email(&email).await.unwrap().expect("user not found");

    assert_eq!(found.id, created.id);
    assert_eq!(found.role, Role::Editor);
    assert_eq!(found.password_hash, created.password_hash);
}

#[tokio::test]
#[ignore]
async fn test_find_unknown_email_is_none() {
    let db = TestDb::connect().await;
    let repo = db.repository(true);

    let found = repo.find_by_email(&unique_email("missing")).await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_rejected() {
    let db = TestDb::connect().await;
    let repo = db.repository(true);
    let email = unique_email("dup");

    repo.create(user(&email, Role::User)).await.unwrap();
    let result = repo.create(user(&email, Role::User)).await;

    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
}

#[tokio::test]
#[ignore]
async fn test_duplicates_allowed_when_not_enforced() {
    let db = TestDb::connect().await;
    let repo = db.repository(false);
    let email = unique_email("lenient");

    let first = repo.create(user(&email, Role::User)).await.unwrap();
    let mut later = user(&email, Role::Admin);
    later.created_at = first.created_at + chrono::Duration::seconds(1);
    repo.create(later).await.unwrap();

    let found = repo.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
#[ignore]
async fn test_enforcement_covers_rows_stored_while_disabled() {
    let db = TestDb::connect().await;
    let email = unique_email("legacy");

    db.repository(false)
        .create(user(&email, Role::User))
        .await
        .unwrap();

    let result = db.repository(true).create(user(&email, Role::User)).await;

    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
}
