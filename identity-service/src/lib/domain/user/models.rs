use std::fmt;
use std::str::FromStr;

use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::PasswordPolicyError;

/// Registered user record.
///
/// Holds the password hash only; the plaintext never reaches this type.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Trimmed, non-empty, at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    const MAX_LENGTH: usize = 100;

    /// Create a new valid name.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming whitespace
    /// * `TooLong` - More than 100 characters
    pub fn new(name: String) -> Result<Self, NameError> {
        let name = name.trim();
        let length = name.chars().count();
        if length == 0 {
            Err(NameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password as received from a client.
///
/// Never printed: `Debug` renders a placeholder.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    /// Reject passwords that cannot be accepted at registration.
    pub fn validate(&self) -> Result<(), PasswordPolicyError> {
        if self.0.is_empty() {
            return Err(PasswordPolicyError::Empty);
        }
        Ok(())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub name: UserName,
    pub email: EmailAddress,
    pub password: Password,
    pub role: Role,
}

impl RegisterUserCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `name` - Validated display name
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    /// * `role` - Requested role
    pub fn new(name: UserName, email: EmailAddress, password: Password, role: Role) -> Self {
        Self {
            name,
            email,
            password,
            role,
        }
    }
}

/// Login attempt, scoped to a single request.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: Password,
}

/// Token handed out after a successful login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user_id: UserId,
    pub role: Role,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_is_trimmed() {
        let name = UserName::new("  Ada Lovelace ".to_string()).unwrap();
        assert_eq!(name.as_str(), "Ada Lovelace");
    }

    #[test]
    fn test_user_name_rejects_blank_and_long() {
        assert_eq!(UserName::new("   ".to_string()), Err(NameError::Empty));
        assert_eq!(
            UserName::new("a".repeat(101)),
            Err(NameError::TooLong {
                max: 100,
                actual: 101
            })
        );
        assert!(UserName::new("a".repeat(100)).is_ok());
    }

    #[test]
    fn test_email_validation() {
        assert!(EmailAddress::new("a@x.com".to_string()).is_ok());
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("hunter2".to_string());
        assert_eq!(format!("{:?}", password), "Password(<redacted>)");
        assert!(password.validate().is_ok());
        assert_eq!(
            Password::new(String::new()).validate(),
            Err(PasswordPolicyError::Empty)
        );
    }

    #[test]
    fn test_user_debug_hides_hash() {
        let user = User {
            id: UserId::new(),
            name: UserName::new("A".to_string()).unwrap(),
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };

        let rendered = format!("{:?}", user);
        assert!(!rendered.contains("argon2id"));
        assert!(rendered.contains("a@x.com"));
    }
}
