use thiserror::Error;

use crate::jwt::TokenCodec;
use crate::jwt::TokenError;
use crate::role::Role;
use crate::role::RoleSet;

/// Reasons a request is refused by [`AccessController::authorize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No bearer credential was presented
    #[error("Access denied")]
    MissingCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Insufficient permissions: role {role} not in {required}")]
    InsufficientPermissions { role: Role, required: String },
}

/// Verified identity attached to an admitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
}

/// Request-time admission: extract, verify, authorize.
///
/// Stateless across requests; every failing step is terminal.
#[derive(Clone)]
pub struct AccessController {
    tokens: TokenCodec,
}

impl AccessController {
    pub fn new(tokens: TokenCodec) -> Self {
        Self { tokens }
    }

    /// Admit or reject a request given its raw `Authorization` header value.
    ///
    /// # Errors
    /// * `MissingCredentials` - Header absent or not of the form `Bearer <token>`
    /// * `InvalidToken` - Token failed verification
    /// * `InsufficientPermissions` - Verified role is not in `required`
    pub fn authorize(
        &self,
        authorization: Option<&str>,
        required: &RoleSet,
    ) -> Result<Principal, AccessError> {
        let token = extract_bearer(authorization).ok_or(AccessError::MissingCredentials)?;

        let claims = self.tokens.verify(token)?;

        if !required.contains(claims.role) {
            return Err(AccessError::InsufficientPermissions {
                role: claims.role,
                required: required.to_string(),
            });
        }

        Ok(Principal {
            subject: claims.sub,
            role: claims.role,
        })
    }
}

/// Pull the token out of `Bearer <token>`.
pub fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let (scheme, token) = authorization?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
