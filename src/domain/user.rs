//! User accounts and roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use crate::error::TaskboardError;

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular user: sees and edits own or assigned tasks.
    #[default]
    User,
    /// Administrator: full access, including user management.
    Admin,
}

impl Role {
    /// Returns the canonical lowercase name stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Returns `true` for [`Role::Admin`].
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(TaskboardError::InvalidRole(other.to_string())),
        }
    }
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Row id.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// bcrypt hash of the password. Never serialized.
    pub password_hash: String,
    /// Access level.
    pub role: Role,
    /// Display color derived from the id (see [`display_color`]).
    pub color: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a user. The store assigns id, color and
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// bcrypt hash of the password.
    pub password_hash: String,
    /// Access level.
    pub role: Role,
}

/// Derives a stable pastel color for a user id.
///
/// The hue is the 32-bit FNV-1a hash of the decimal id string modulo 360.
#[must_use]
pub fn display_color(id: UserId) -> String {
    let hue = fnv1a_32(id.to_string().as_bytes()) % 360;
    format!("hsl({hue}, 70%, 80%)")
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn color_for_first_user() {
        assert_eq!(display_color(UserId::new(1)), "hsl(4, 70%, 80%)");
    }

    #[test]
    fn color_is_stable_and_varies_by_id() {
        assert_eq!(display_color(UserId::new(2)), "hsl(181, 70%, 80%)");
        assert_eq!(display_color(UserId::new(42)), "hsl(11, 70%, 80%)");
    }

    #[test]
    fn role_parses_known_names_only() {
        assert_eq!("admin".parse::<Role>().ok(), Some(Role::Admin));
        assert_eq!("user".parse::<Role>().ok(), Some(Role::User));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Admin).ok();
        assert_eq!(json.as_deref(), Some("\"admin\""));
    }
}
