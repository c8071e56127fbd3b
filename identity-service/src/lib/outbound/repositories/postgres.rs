use async_trait::async_trait;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserName;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const UNIQUE_EMAIL_CONSTRAINT: &str = "users_unique_email_key";

pub struct PostgresUserRepository {
    pool: PgPool,
    enforce_unique_email: bool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool, enforce_unique_email: bool) -> Self {
        Self {
            pool,
            enforce_unique_email,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| UserError::StoreUnavailable(format!("corrupt role column: {}", e)))?;

        Ok(User {
            id: UserId(row.id),
            name: UserName::new(row.name)
                .map_err(|e| UserError::StoreUnavailable(format!("corrupt name column: {}", e)))?,
            email: EmailAddress::new(row.email)
                .map_err(|e| UserError::StoreUnavailable(format!("corrupt email column: {}", e)))?,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let unique_email = self.enforce_unique_email.then(|| user.email.as_str());

        // The existence check also covers rows stored while enforcement was off;
        // the unique_email constraint settles concurrent inserts.
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, unique_email, password_hash, role, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT $8 OR NOT EXISTS (SELECT 1 FROM users WHERE email = $3)
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(unique_email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(self.enforce_unique_email)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(UNIQUE_EMAIL_CONSTRAINT)
                {
                    return UserError::DuplicateEmail(user.email.to_string());
                }
            }
            UserError::StoreUnavailable(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(UserError::DuplicateEmail(user.email.to_string()));
        }

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::StoreUnavailable(e.to_string()))?;

        row.map(User::try_from).transpose()
    }
}
