//! Typed ids for owned entities.
//!
//! Ownership checks compare these ids across entities, so a `UserId` can
//! never be mistaken for the id of the account it owns.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a transparent `Uuid` wrapper with conversions in both directions.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new time-ordered id (UUID v7).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Owner of accounts, categories and transactions.");
typed_id!(AccountId, "Identifier of a money account.");
typed_id!(CategoryId, "Identifier of a transaction category.");
typed_id!(TransactionId, "Identifier of a ledger transaction.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trips_through_uuid() {
        let uuid = Uuid::new_v4();
        let id = AccountId::from(uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(id.into_inner(), uuid);
    }

    #[test]
    fn test_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(CategoryId::from_uuid(uuid).to_string(), uuid.to_string());
    }

    #[test]
    fn test_parse() {
        let uuid = Uuid::new_v4();
        assert_eq!(UserId::from_str(&uuid.to_string()).unwrap().0, uuid);
        assert!(TransactionId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(AccountId::new(), AccountId::new());
    }
}
