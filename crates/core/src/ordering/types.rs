//! Types shared by the ordering components.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Position of an entity inside its ordering group.
pub type Position = i32;

/// Lifecycle status of an ordered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    /// Listed and part of its ordering group.
    Active,
    /// Kept for history only; outside every ordering group.
    Archived,
}

impl EntityStatus {
    /// Returns true if the entity takes part in ordering.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// An entity that occupies a slot in an ordering group.
pub trait Ordered {
    /// Identifier type of the entity.
    type Id: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display;

    /// The entity id.
    fn id(&self) -> Self::Id;

    /// Current position, `None` once the entity left its group.
    fn position(&self) -> Option<Position>;

    /// Lifecycle status.
    fn status(&self) -> EntityStatus;
}

/// An ordered entity that may hang under a parent of the same kind.
pub trait Nested: Ordered {
    /// Parent id, `None` for root-level entities.
    fn parent(&self) -> Option<Self::Id>;
}

/// A single `order` rewrite within an unchanged group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderWrite<Id> {
    /// Entity to update.
    pub id: Id,
    /// New position.
    pub order: Position,
}

/// An `order` rewrite that also sets the parent, moving the entity between groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementWrite<Id> {
    /// Entity to update.
    pub id: Id,
    /// New position.
    pub order: Position,
    /// New parent; `None` places the entity at root level.
    pub parent: Option<Id>,
}

/// Converts a slice index into a position.
///
/// Groups are bounded by the per-user entity limits, far below `i32::MAX`.
#[must_use]
pub(crate) fn position_at(index: usize) -> Position {
    Position::try_from(index).unwrap_or(Position::MAX)
}

/// Sorts entities by position, archived or unplaced ones last, ties broken by id.
pub(crate) fn sorted_by_position<T: Ordered>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| (item.position().unwrap_or(Position::MAX), item.id()));
    sorted
}


#[cfg(test)]
mod tests {
    use super::fixtures::Item;
    use super::*;

    #[test]
    fn test_sorted_by_position_puts_unplaced_last() {
        let mut unplaced = Item::active(9, 0);
        unplaced.order = None;
        let items = vec![Item::active(3, 1), unplaced, Item::active(1, 0)];

        let ids: Vec<u32> = sorted_by_position(&items).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 9]);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&EntityStatus::Archived).unwrap(),
            "\"ARCHIVED\""
        );
        assert!(EntityStatus::Active.is_active());
    }
}
