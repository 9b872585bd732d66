use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::user::{User, UserRepository};

/// User manager.
#[derive(Clone)]
pub struct UserService {
    pub repo: UserRepository,
    pub crypto: Arc<PasswordManager>,
    pub data: User,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(
        user: User,
        pool: Pool<Postgres>,
        crypto: Arc<PasswordManager>,
    ) -> Self {
        Self {
            data: user,
            repo: UserRepository::new(pool),
            crypto,
        }
    }

    /// Create builded user.
    ///
    /// Hash password before insert; the account starts unverified.
    pub async fn create_user(mut self) -> Result<Self> {
        self.data.password = self.crypto.hash_password(&self.data.password)?;
        self.data.verified = false;

        self.repo.insert(&self.data).await?;
        Ok(self)
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(mut self) -> Result<Self> {
        self.data = self.repo.find_by_id(self.data.id).await?;
        Ok(self)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(mut self) -> Result<Self> {
        self.data = self.repo.find_by_email(&self.data.email).await?;
        Ok(self)
    }

    /// Check a candidate password against the stored hash.
    ///
    /// Wrong password and disabled account both collapse into the same
    /// authentication failure.
    pub fn authenticate(&self, password: &str) -> Result<()> {
        if !self.data.is_active {
            return Err(ServerError::Unauthorized);
        }

        self.crypto
            .verify_password(password, &self.data.password)
            .map_err(|_| ServerError::Unauthorized)
    }

    /// Update current user.
    pub async fn update(&self) -> Result<()> {
        self.repo.update(&self.data).await
    }

    /// Delete current user.
    pub async fn delete(&self) -> Result<()> {
        self.repo.delete(self.data.id).await
    }
}
