//! Typed builder for User.

use std::sync::Arc;

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::crypto::PasswordManager;
use crate::user::{Role, User, UserService};

/// [`User`] builder.
#[derive(Debug, Clone)]
pub struct UserBuilder<Id, Email> {
    id: Id,
    email: Email,
    password: String,
    firstname: Option<String>,
    lastname: Option<String>,
    phone: Option<String>,
    image: Option<String>,
    roles: Vec<Role>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            id: Missing,
            email: Missing,
            password: String::default(),
            firstname: None,
            lastname: None,
            phone: None,
            image: None,
            roles: crate::user::default_roles(),
        }
    }
}

impl<Email> UserBuilder<Missing, Email> {
    /// Update `id` field on [`UserBuilder`].
    pub fn id(self, id: Uuid) -> UserBuilder<Present<Uuid>, Email> {
        UserBuilder {
            id: Present(id),
            email: self.email,
            password: self.password,
            firstname: self.firstname,
            lastname: self.lastname,
            phone: self.phone,
            image: self.image,
            roles: self.roles,
        }
    }
}

impl<Id> UserBuilder<Id, Missing> {
    /// Update `email` field on [`UserBuilder`].
    ///
    /// Addresses are case-normalized here, so every lookup and insert
    /// downstream sees the same form.
    pub fn email(
        self,
        email: impl AsRef<str>,
    ) -> UserBuilder<Id, Present<String>> {
        UserBuilder {
            id: self.id,
            email: Present(email.as_ref().trim().to_lowercase()),
            password: self.password,
            firstname: self.firstname,
            lastname: self.lastname,
            phone: self.phone,
            image: self.image,
            roles: self.roles,
        }
    }
}

impl<Id, Email> UserBuilder<Id, Email> {
    /// Update `password` field on [`UserBuilder`].
    pub fn password(mut self, password: impl ToString) -> Self {
        self.password = password.to_string();
        self
    }

    /// Update `firstname` field on [`UserBuilder`].
    pub fn firstname(mut self, firstname: Option<String>) -> Self {
        self.firstname = firstname;
        self
    }

    /// Update `lastname` field on [`UserBuilder`].
    pub fn lastname(mut self, lastname: Option<String>) -> Self {
        self.lastname = lastname;
        self
    }

    /// Update `phone` field on [`UserBuilder`].
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }

    /// Update `image` field on [`UserBuilder`].
    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// Update `roles` field on [`UserBuilder`].
    pub fn roles(mut self, roles: Option<Vec<Role>>) -> Self {
        self.roles = roles
            .filter(|roles| !roles.is_empty())
            .unwrap_or_else(crate::user::default_roles);
        self
    }
}

impl UserBuilder<Missing, Present<String>> {
    /// Build a [`User`] with `email` and a generated id.
    pub fn build(
        self,
        pool: Pool<Postgres>,
        crypto: Arc<PasswordManager>,
    ) -> UserService {
        let user = User {
            id: Uuid::new_v4(),
            email: self.email.0,
            password: self.password,
            firstname: self.firstname,
            lastname: self.lastname,
            phone: self.phone,
            image: self.image,
            roles: self.roles,
            is_active: true,
            ..Default::default()
        };

        UserService::new(user, pool, crypto)
    }
}

impl UserBuilder<Present<Uuid>, Missing> {
    /// Build a [`User`] with `id`.
    pub fn build(
        self,
        pool: Pool<Postgres>,
        crypto: Arc<PasswordManager>,
    ) -> UserService {
        let user = User {
            id: self.id.0,
            password: self.password,
            firstname: self.firstname,
            lastname: self.lastname,
            phone: self.phone,
            image: self.image,
            roles: self.roles,
            ..Default::default()
        };

        UserService::new(user, pool, crypto)
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let builder = UserBuilder::new().email("  User@Example.COM ");
        assert_eq!(builder.email.0, "user@example.com");
    }

    #[test]
    fn test_empty_roles_fall_back_to_default() {
        let builder = UserBuilder::new().roles(Some(vec![]));
        assert_eq!(builder.roles, crate::user::default_roles());

        let builder = UserBuilder::new().roles(Some(vec![Role::Admin]));
        assert_eq!(builder.roles, vec![Role::Admin]);
    }
}
