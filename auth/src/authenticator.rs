use std::sync::OnceLock;

use chrono::Duration;

use crate::jwt::TokenCodec;
use crate::jwt::TokenError;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::role::Role;

/// Plaintext behind the decoy hash; never matches a real login.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-subjects";

/// Authentication coordinator combining password verification and token issuance.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    decoy_hash: OnceLock<Option<String>>,
}

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// Signed bearer token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `password_hasher` - Hasher configured with the deployment's cost
    /// * `token_codec` - Codec holding the signing secret
    pub fn new(password_hasher: PasswordHasher, token_codec: TokenCodec) -> Self {
        Self {
            password_hasher,
            token_codec,
            decoy_hash: OnceLock::new(),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue a token for `subject`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Identifier placed in the `sub` claim
    /// * `role` - Role placed in the `role` claim
    /// * `ttl` - Token lifetime
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash could not be read
    /// * `TokenError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: impl ToString,
        role: Role,
        ttl: Duration,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.token_codec.issue(subject, role, ttl)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Reject a login for a subject that does not exist.
    ///
    /// Runs one verification against a decoy hash built with the same cost,
    /// so the caller spends as long as it would on a wrong password.
    pub fn reject_unknown(&self, password: &str) -> AuthenticationError {
        if let Some(hash) = self.decoy_hash() {
            let _ = self.password_hasher.verify(password, hash);
        }
        AuthenticationError::InvalidCredentials
    }

    fn decoy_hash(&self) -> Option<&str> {
        self.decoy_hash
            .get_or_init(|| self.password_hasher.hash(DECOY_PASSWORD).ok())
            .as_deref()
    }

    pub fn token_codec(&self) -> &TokenCodec {
        &self.token_codec
    }
}
