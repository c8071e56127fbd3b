use async_trait::async_trait;

use crate::domain::user::models::Credentials;
use crate::domain::user::models::IssuedToken;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// Hashes the password and persists the record in one store write.
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `InvalidPassword` - Password rejected before hashing
    /// * `DuplicateEmail` - Email is already registered (when enforced)
    /// * `Password` - Hashing failed
    /// * `StoreUnavailable` - Credential store failed
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError>;

    /// Check credentials and issue a bearer token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `Password` - Stored hash is unreadable
    /// * `Token` - Token could not be signed
    /// * `StoreUnavailable` - Credential store failed
    async fn authenticate(&self, credentials: Credentials) -> Result<IssuedToken, UserError>;
}

/// Persistence operations for user records.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// The write is atomic: either the full record becomes visible or nothing does.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered and uniqueness is enforced
    /// * `StoreUnavailable` - Storage operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by email address.
    ///
    /// With uniqueness disabled several records may share an email; the
    /// earliest created one is returned.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `StoreUnavailable` - Storage operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
}
