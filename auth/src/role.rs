use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Error for role parsing and role set construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0} (expected admin, editor or user)")]
    Unknown(String),

    #[error("Role set must contain at least one role")]
    EmptySet,
}

/// Role carried by a user record and by every issued token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "user" => Ok(Role::User),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

/// Non-empty set of roles admitted by a protected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Build a role set from any collection of roles.
    ///
    /// # Errors
    /// * `EmptySet` - No role was given
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, RoleError> {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(RoleError::EmptySet);
        }
        Ok(Self(roles))
    }

    /// Set admitting a single role.
    pub fn only(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    /// Set admitting every known role.
    pub fn all() -> Self {
        Self(Role::ALL.into_iter().collect())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
