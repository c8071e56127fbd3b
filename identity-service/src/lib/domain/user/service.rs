use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Duration;
use chrono::Utc;

use crate::domain::user::models::Credentials;
use crate::domain::user::models::IssuedToken;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for registration and login.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
    token_ttl: Duration,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store implementation
    /// * `authenticator` - Password hasher and token codec
    /// * `token_ttl` - Lifetime of issued tokens
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>, token_ttl: Duration) -> Self {
        Self {
            repository,
            authenticator,
            token_ttl,
        }
    }

    /// Find a user by email, treating absence as an error.
    pub async fn find_user_by_email(&self, email: &str) -> Result<User, UserError> {
        self.repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| UserError::NotFound(email.to_string()))
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        command.password.validate()?;

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let password_hash =
            run_blocking(move || authenticator.hash_password(password.expose())).await??;

        let user = User {
            id: UserId::new(),
            name: command.name,
            email: command.email,
            password_hash,
            role: command.role,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user).await?;

        tracing::info!(
            user_id = %created_user.id,
            role = %created_user.role,
            "User registered"
        );

        Ok(created_user)
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<IssuedToken, UserError> {
        let lookup = self.find_user_by_email(&credentials.email).await;
        let authenticator = Arc::clone(&self.authenticator);
        let password = credentials.password;

        let user = match lookup {
            Ok(user) => user,
            Err(UserError::NotFound(_)) => {
                let rejection =
                    run_blocking(move || authenticator.reject_unknown(password.expose())).await?;
                tracing::debug!(reason = %rejection, "Login rejected: unknown email");
                return Err(UserError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let stored_hash = user.password_hash.clone();
        let (subject, role, ttl) = (user.id, user.role, self.token_ttl);

        let result = run_blocking(move || {
            authenticator.authenticate(password.expose(), &stored_hash, subject, role, ttl)
        })
        .await?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => {
                tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
                UserError::InvalidCredentials
            }
            AuthenticationError::PasswordError(err) => UserError::Password(err),
            AuthenticationError::TokenError(err) => UserError::Token(err),
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(IssuedToken {
            user_id: user.id,
            role: user.role,
            access_token: result.access_token,
        })
    }
}

/// Run CPU-bound hashing off the async worker threads.
async fn run_blocking<T, F>(task: F) -> Result<T, UserError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| UserError::TaskFailed(e.to_string()))
}
