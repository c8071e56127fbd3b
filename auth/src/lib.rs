//! Authentication and authorization primitives
//!
//! Transport-agnostic building blocks for a token-based API:
//! - Password hashing (Argon2id, configurable cost)
//! - Signed, expiring bearer tokens carrying a role claim (HS256)
//! - Role-based admission of requests
//! - Per-client fixed-window request throttling
//!
//! Services wire these into their own HTTP layer and persistence.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Tokens and role checks
//! ```
//! use auth::{AccessController, Role, RoleSet, TokenCodec};
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec.issue("user123", Role::User, Duration::hours(1)).unwrap();
//!
//! let controller = AccessController::new(codec);
//! let header = format!("Bearer {}", token);
//! assert!(controller.authorize(Some(&header), &RoleSet::only(Role::User)).is_ok());
//! assert!(controller.authorize(Some(&header), &RoleSet::only(Role::Admin)).is_err());
//! ```
//!
//! ## Throttling
//! ```
//! use auth::{RequestThrottler, ThrottleConfig, ThrottleDecision};
//!
//! let throttler = RequestThrottler::new(ThrottleConfig::default());
//! assert!(matches!(throttler.check("203.0.113.7"), ThrottleDecision::Allowed { .. }));
//! ```

pub mod access;
pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod role;
pub mod throttle;

// Re-export commonly used items
pub use access::AccessController;
pub use access::AccessError;
pub use access::Principal;
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use password::HashingCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use role::Role;
pub use role::RoleError;
pub use role::RoleSet;
pub use throttle::RequestThrottler;
pub use throttle::ThrottleConfig;
pub use throttle::ThrottleDecision;
