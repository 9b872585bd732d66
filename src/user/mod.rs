mod builder;
mod repository;
mod service;

pub use builder::*;
pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A role tag granting specific permissions.
///
/// Stored as the `user_role` PostgreSQL enumeration; a user holds one to
/// four of them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Candidate,
    Admin,
    Superadmin,
}

/// Role set granted when none is requested.
pub fn default_roles() -> Vec<Role> {
    vec![Role::Candidate]
}

/// User as saved on database.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub roles: Vec<Role>,
    pub verified: bool,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip)]
    pub modified_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Whether `role` is part of this user's role set.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Concatenated display name.
    pub fn fullname(&self) -> String {
        match (&self.firstname, &self.lastname) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_role() {
        let user = User {
            roles: vec![Role::Candidate, Role::Admin],
            ..Default::default()
        };

        assert!(user.has_role(Role::Admin));
        assert!(!user.has_role(Role::Superadmin));
    }

    #[test]
    fn test_fullname_skips_missing_parts() {
        let mut user = User {
            firstname: Some("Jane".into()),
            lastname: Some("Doe".into()),
            ..Default::default()
        };
        assert_eq!(user.fullname(), "Jane Doe");

        user.lastname = None;
        assert_eq!(user.fullname(), "Jane");

        user.firstname = None;
        assert_eq!(user.fullname(), "");
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&vec![Role::Candidate, Role::Superadmin])
                .unwrap(),
            r#"["CANDIDATE","SUPERADMIN"]"#
        );
    }
}
