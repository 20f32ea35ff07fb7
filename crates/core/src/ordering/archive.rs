//! Write plans for archiving, removal and re-activation.
//!
//! Archiving pulls an entity out of its ordering group. The plan contains
//! everything the caller must write inside one transaction: the entity's own
//! detachment, children moved to the root level (categories only) and the
//! renumbered remaining siblings.

use super::error::OrderingError;
use super::sequencer::OrderSequencer;
use super::types::{
    EntityStatus, Nested, OrderWrite, Ordered, PlacementWrite, Position, position_at,
    sorted_by_position,
};

/// Writes produced by archiving (or deleting) one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePlan<Id> {
    /// The entity leaving its group; its order and parent are cleared.
    pub archived: Id,
    /// Former children, now root-level and appended after the root group.
    pub detached_children: Vec<PlacementWrite<Id>>,
    /// Renumbered remaining members of the original group.
    pub sibling_writes: Vec<OrderWrite<Id>>,
}

/// Plans the structural side of the `ACTIVE -> ARCHIVED` transition.
pub struct ArchivalCoordinator;

impl ArchivalCoordinator {
    /// Plans archiving a flat entity (accounts).
    ///
    /// `siblings` is the active group the entity belongs to; the entity may
    /// or may not be part of it.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyArchived` if the entity is not active.
    pub fn plan<T: Ordered>(entity: &T, siblings: &[T]) -> Result<ArchivePlan<T::Id>, OrderingError> {
        ensure_active(entity)?;

        Ok(ArchivePlan {
            archived: entity.id(),
            detached_children: Vec::new(),
            sibling_writes: resequence_without(entity.id(), siblings),
        })
    }

    /// Plans archiving or deleting a nested entity (categories).
    ///
    /// `children` must be the loaded children relation; pass an empty slice
    /// for an entity without children. Children are appended to the root
    /// group in their current relative order, after the root members that
    /// remain once the entity itself has left.
    ///
    /// # Errors
    ///
    /// Returns `ChildrenNotLoaded` if `children` is `None`, `NestedParent`
    /// if a nested entity reports children, and `AlreadyArchived` if the
    /// entity is not active. All are raised before any write is planned.
    pub fn plan_with_children<T: Nested>(
        entity: &T,
        siblings: &[T],
        children: Option<&[T]>,
    ) -> Result<ArchivePlan<T::Id>, OrderingError> {
        let children =
            children.ok_or_else(|| OrderingError::ChildrenNotLoaded(entity.id().to_string()))?;
        if entity.parent().is_some() && !children.is_empty() {
            return Err(OrderingError::NestedParent(entity.id().to_string()));
        }
        ensure_active(entity)?;

        let sibling_writes = resequence_without(entity.id(), siblings);
        let root_size = sibling_writes.len();

        let detached_children = sorted_by_position(children)
            .into_iter()
            .enumerate()
            .map(|(index, child)| PlacementWrite {
                id: child.id(),
                order: position_at(root_size + index),
                parent: None,
            })
            .collect();

        Ok(ArchivePlan {
            archived: entity.id(),
            detached_children,
            sibling_writes,
        })
    }

    /// Position an archived entity takes when it becomes active again.
    ///
    /// Re-activation always appends to the end of the target group.
    ///
    /// # Errors
    ///
    /// Returns `NotArchived` if the entity is already active.
    pub fn reactivation_position<T: Ordered>(
        entity: &T,
        target_group_size: usize,
    ) -> Result<Position, OrderingError> {
        if entity.status().is_active() {
            return Err(OrderingError::NotArchived(entity.id().to_string()));
        }
        Ok(OrderSequencer::append_position(target_group_size))
    }
}

fn ensure_active<T: Ordered>(entity: &T) -> Result<(), OrderingError> {
    if entity.status() == EntityStatus::Archived {
        return Err(OrderingError::AlreadyArchived(entity.id().to_string()));
    }
    Ok(())
}

fn resequence_without<T: Ordered>(removed: T::Id, siblings: &[T]) -> Vec<OrderWrite<T::Id>> {
    OrderSequencer::resequence_ids(
        sorted_by_position(siblings)
            .into_iter()
            .map(Ordered::id)
            .filter(|id| *id != removed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::types::fixtures::Item;

    #[test]
    fn test_plan_resequences_remaining_siblings() {
        let group = vec![Item::active(1, 0), Item::active(2, 1), Item::active(3, 2)];

        let plan = ArchivalCoordinator::plan(&group[1], &group).unwrap();

        assert_eq!(plan.archived, 2);
        assert!(plan.detached_children.is_empty());
        assert_eq!(
            plan.sibling_writes,
            vec![OrderWrite { id: 1, order: 0 }, OrderWrite { id: 3, order: 1 }]
        );
    }

    #[test]
    fn test_plan_rejects_archived_entity() {
        let mut entity = Item::active(1, 0);
        entity.status = EntityStatus::Archived;
        entity.order = None;

        assert_eq!(
            ArchivalCoordinator::plan(&entity, &[]),
            Err(OrderingError::AlreadyArchived("1".into()))
        );
    }

    #[test]
    fn test_children_appended_after_remaining_root_group() {
        let roots = vec![Item::active(1, 0), Item::active(2, 1), Item::active(3, 2)];
        let children = vec![Item::active(11, 1).child_of(2), Item::active(10, 0).child_of(2)];

        let plan =
            ArchivalCoordinator::plan_with_children(&roots[1], &roots, Some(children.as_slice())).unwrap();

        assert_eq!(
            plan.sibling_writes,
            vec![OrderWrite { id: 1, order: 0 }, OrderWrite { id: 3, order: 1 }]
        );
        assert_eq!(
            plan.detached_children,
            vec![
                PlacementWrite { id: 10, order: 2, parent: None },
                PlacementWrite { id: 11, order: 3, parent: None },
            ]
        );
    }

    #[test]
    fn test_children_not_loaded_is_internal() {
        let roots = vec![Item::active(1, 0)];
        let err = ArchivalCoordinator::plan_with_children(&roots[0], &roots, None).unwrap_err();
        assert_eq!(err, OrderingError::ChildrenNotLoaded("1".into()));
    }

    #[test]
    fn test_nested_entity_with_children_is_internal() {
        let child = Item::active(5, 0).child_of(1);
        let grandchild = vec![Item::active(6, 0).child_of(5)];
        let err = ArchivalCoordinator::plan_with_children(&child, &[], Some(grandchild.as_slice()))
            .unwrap_err();
        assert_eq!(err, OrderingError::NestedParent("5".into()));
    }

    #[test]
    fn test_archiving_a_child_only_touches_its_level() {
        let level = vec![Item::active(5, 0).child_of(1), Item::active(6, 1).child_of(1)];

        let plan = ArchivalCoordinator::plan_with_children(&level[0], &level, Some(&[] as &[Item])).unwrap();

        assert_eq!(plan.sibling_writes, vec![OrderWrite { id: 6, order: 0 }]);
        assert!(plan.detached_children.is_empty());
    }

    #[test]
    fn test_reactivation_appends() {
        let mut entity = Item::active(1, 0);
        assert_eq!(
            ArchivalCoordinator::reactivation_position(&entity, 3),
            Err(OrderingError::NotArchived("1".into()))
        );

        entity.status = EntityStatus::Archived;
        assert_eq!(ArchivalCoordinator::reactivation_position(&entity, 3), Ok(3));
    }
}
