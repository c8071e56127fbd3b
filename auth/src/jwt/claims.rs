use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

use crate::role::Role;

/// Claim set carried by every bearer token.
///
/// Timestamps are Unix seconds. A token is valid for `iat <= now < exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Role granted to the subject at issuance
    pub role: Role,

    /// Issued at
    pub iat: i64,

    /// Expiration time
    pub exp: i64,
}

impl Claims {
    /// Create claims for a subject issued at `issued_at` and valid for `ttl`.
    pub fn new(subject: impl ToString, role: Role, issued_at: i64, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            role,
            iat: issued_at,
            exp: issued_at + ttl.num_seconds(),
        }
    }

    /// Check if token is expired.
    ///
    /// Expiry is exclusive: at `exp` the token is already expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}
