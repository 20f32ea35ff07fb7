//! Append positions and group renumbering.

use super::error::OrderingError;
use super::types::{OrderWrite, Ordered, Position, position_at, sorted_by_position};

/// Computes `order` values that keep a group dense.
///
/// The sequencer never decides which entity wins a slot: it only numbers a
/// list that is already in its final order.
pub struct OrderSequencer;

impl OrderSequencer {
    /// Position for a new member appended to a group of `active_siblings`.
    #[must_use]
    pub fn append_position(active_siblings: usize) -> Position {
        position_at(active_siblings)
    }

    /// Renumbers `siblings` as `0..n` in slice order.
    ///
    /// Every member gets a write, changed or not.
    #[must_use]
    pub fn resequence<T: Ordered>(siblings: &[T]) -> Vec<OrderWrite<T::Id>> {
        Self::resequence_ids(siblings.iter().map(Ordered::id))
    }

    /// Renumbers ids as `0..n` in iteration order.
    pub fn resequence_ids<Id>(ids: impl IntoIterator<Item = Id>) -> Vec<OrderWrite<Id>> {
        ids.into_iter()
            .enumerate()
            .map(|(index, id)| OrderWrite {
                id,
                order: position_at(index),
            })
            .collect()
    }

    /// Moves one member of a group to `target` and renumbers the group.
    ///
    /// `siblings` is the whole active group including the moving entity;
    /// its current positions decide the relative order of everyone else.
    ///
    /// # Errors
    ///
    /// Returns `NodesNotFound` if `moving` is not in the group and
    /// `PositionOutOfRange` if `target` is not in `0..n`.
    pub fn relocate<T: Ordered>(
        siblings: &[T],
        moving: T::Id,
        target: Position,
    ) -> Result<Vec<OrderWrite<T::Id>>, OrderingError> {
        let mut ids: Vec<T::Id> = sorted_by_position(siblings)
            .into_iter()
            .map(Ordered::id)
            .collect();

        let current = ids
            .iter()
            .position(|id| *id == moving)
            .ok_or_else(|| OrderingError::NodesNotFound {
                ids: vec![moving.to_string()],
            })?;

        let target_index = usize::try_from(target)
            .ok()
            .filter(|index| *index < ids.len())
            .ok_or(OrderingError::PositionOutOfRange {
                order: target,
                size: ids.len(),
            })?;

        let id = ids.remove(current);
        ids.insert(target_index, id);

        Ok(Self::resequence_ids(ids))
    }

    /// Returns true if `orders` is exactly `{0, .., n-1}`.
    pub fn is_dense(orders: impl IntoIterator<Item = Position>) -> bool {
        let mut orders: Vec<Position> = orders.into_iter().collect();
        orders.sort_unstable();
        orders
            .iter()
            .enumerate()
            .all(|(index, order)| *order == position_at(index))
    }
}

/// Rejects a create or re-activation once a user owns `limit` active entries.
///
/// # Errors
///
/// Returns `CapacityExceeded` if `active_total >= limit`.
pub fn ensure_capacity(active_total: u64, limit: u64) -> Result<(), OrderingError> {
    if active_total >= limit {
        return Err(OrderingError::CapacityExceeded { limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::types::fixtures::Item;

    #[test]
    fn test_append_position_is_group_size() {
        assert_eq!(OrderSequencer::append_position(0), 0);
        assert_eq!(OrderSequencer::append_position(4), 4);
    }

    #[test]
    fn test_resequence_closes_gaps() {
        let siblings = vec![Item::active(7, 0), Item::active(8, 2), Item::active(9, 5)];

        let writes = OrderSequencer::resequence(&siblings);

        assert_eq!(
            writes,
            vec![
                OrderWrite { id: 7, order: 0 },
                OrderWrite { id: 8, order: 1 },
                OrderWrite { id: 9, order: 2 },
            ]
        );
    }

    #[test]
    fn test_resequence_empty_group() {
        let siblings: Vec<Item> = vec![];
        assert!(OrderSequencer::resequence(&siblings).is_empty());
    }

    #[test]
    fn test_relocate_moves_forward() {
        let siblings = vec![Item::active(1, 0), Item::active(2, 1), Item::active(3, 2)];

        let writes = OrderSequencer::relocate(&siblings, 1, 2).unwrap();

        let ids: Vec<u32> = writes.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(OrderSequencer::is_dense(writes.iter().map(|w| w.order)));
    }

    #[test]
    fn test_relocate_moves_backward() {
        let siblings = vec![Item::active(1, 0), Item::active(2, 1), Item::active(3, 2)];

        let writes = OrderSequencer::relocate(&siblings, 3, 0).unwrap();

        let ids: Vec<u32> = writes.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_relocate_rejects_out_of_range() {
        let siblings = vec![Item::active(1, 0), Item::active(2, 1)];

        assert_eq!(
            OrderSequencer::relocate(&siblings, 1, 2),
            Err(OrderingError::PositionOutOfRange { order: 2, size: 2 })
        );
        assert!(OrderSequencer::relocate(&siblings, 1, -1).is_err());
    }

    #[test]
    fn test_relocate_unknown_member() {
        let siblings = vec![Item::active(1, 0)];
        assert!(matches!(
            OrderSequencer::relocate(&siblings, 5, 0),
            Err(OrderingError::NodesNotFound { .. })
        ));
    }

    #[test]
    fn test_is_dense() {
        assert!(OrderSequencer::is_dense([2, 0, 1]));
        assert!(OrderSequencer::is_dense([]));
        assert!(!OrderSequencer::is_dense([0, 2]));
        assert!(!OrderSequencer::is_dense([0, 0, 1]));
    }

    #[test]
    fn test_ensure_capacity() {
        assert!(ensure_capacity(2, 3).is_ok());
        assert_eq!(
            ensure_capacity(3, 3),
            Err(OrderingError::CapacityExceeded { limit: 3 })
        );
    }
}
