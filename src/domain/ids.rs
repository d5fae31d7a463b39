//! Type-safe entity identifiers.
//!
//! Each persisted entity gets a newtype around the database row id so that
//! a [`UserId`] cannot be passed where a [`TaskId`] is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw row id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier of a user account.
    UserId
);

entity_id!(
    /// Unique identifier of a task.
    TaskId
);

entity_id!(
    /// Unique identifier of a task template.
    TemplateId
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&TaskId::new(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));
    }

    #[test]
    fn deserializes_from_number() {
        let Ok(id) = serde_json::from_str::<UserId>("7") else {
            panic!("deserialization failed");
        };
        assert_eq!(id.get(), 7);
    }

    #[test]
    fn display_is_raw_id() {
        assert_eq!(TemplateId::new(3).to_string(), "3");
    }

    #[test]
    fn hash_works_in_hashset() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(UserId::new(1));
        set.insert(UserId::new(1));
        assert_eq!(set.len(), 1);
    }
}
