use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::models::User;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local credential store.
///
/// Records are kept in insertion order, so lookups by email return the
/// earliest registration. Contents are lost on restart.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
    enforce_unique_email: bool,
}

impl InMemoryUserRepository {
    pub fn new(enforce_unique_email: bool) -> Self {
        Self {
            users: Arc::new(RwLock::new(Vec::new())),
            enforce_unique_email,
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        // Uniqueness check and insert share one write guard
        let mut users = self.users.write().await;

        if self.enforce_unique_email && users.iter().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email.to_string()));
        }

        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }
}
