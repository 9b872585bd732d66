mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an opaque token can be redeemed for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "ticket_purpose", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Purpose {
    AccountVerification,
    PasswordReset,
}

impl Purpose {
    /// Length of the random opaque string.
    ///
    /// Verification tokens travel inside a link and can afford to be long;
    /// reset tokens are typed by hand.
    pub fn token_length(&self) -> usize {
        match self {
            Purpose::AccountVerification => 100,
            Purpose::PasswordReset => 6,
        }
    }
}

/// Single-use capability as saved on database.
///
/// A ticket is deleted when redeemed; one that outlives the configured
/// lifespan stays in place but is permanently invalid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub token: String,
    pub user_id: Uuid,
    pub purpose: Purpose,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Ticket {
    /// Whether the ticket is still within its validity window.
    ///
    /// An elapsed time equal to the lifespan is already invalid.
    pub fn is_valid(&self, lifespan: chrono::Duration) -> bool {
        chrono::Utc::now() - self.created_at < lifespan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(age: chrono::Duration) -> Ticket {
        Ticket {
            token: "abc123".into(),
            user_id: Uuid::new_v4(),
            purpose: Purpose::PasswordReset,
            created_at: chrono::Utc::now() - age,
        }
    }

    #[test]
    fn test_fresh_ticket_is_valid() {
        let lifespan = chrono::Duration::hours(24);
        assert!(ticket(chrono::Duration::zero()).is_valid(lifespan));
        assert!(ticket(chrono::Duration::hours(23)).is_valid(lifespan));
    }

    #[test]
    fn test_elapsed_lifespan_is_invalid() {
        let lifespan = chrono::Duration::hours(24);
        assert!(!ticket(chrono::Duration::hours(24)).is_valid(lifespan));
        assert!(!ticket(chrono::Duration::days(2)).is_valid(lifespan));
    }

    #[test]
    fn test_token_length_per_purpose() {
        assert_eq!(Purpose::AccountVerification.token_length(), 100);
        assert_eq!(Purpose::PasswordReset.token_length(), 6);
    }
}
