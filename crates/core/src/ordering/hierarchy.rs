//! Two-level parent/child rules for transaction categories.

use std::fmt::Display;

use tally_shared::types::UserId;

use super::error::OrderingError;
use super::types::EntityStatus;

/// The parts of a category that parent assignment depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode<Id, K> {
    /// Entity id.
    pub id: Id,
    /// Owner.
    pub user_id: UserId,
    /// Category type; parent and child must share it.
    pub kind: K,
    /// Current parent.
    pub parent: Option<Id>,
    /// Lifecycle status.
    pub status: EntityStatus,
    /// Number of children currently hanging under this node.
    pub child_count: usize,
}

/// Checks that `child` may be placed under `parent`.
///
/// The tree is at most two levels deep: a parent must be root-level and a
/// node with children cannot become a child.
///
/// # Errors
///
/// Returns a `Conflict`-kind error naming the violated rule.
pub fn validate_parent_assignment<Id, K>(
    child: &HierarchyNode<Id, K>,
    parent: &HierarchyNode<Id, K>,
) -> Result<(), OrderingError>
where
    Id: PartialEq + Display,
    K: PartialEq + Display,
{
    if child.id == parent.id {
        return Err(OrderingError::SelfParent(child.id.to_string()));
    }
    if child.user_id != parent.user_id {
        return Err(OrderingError::ParentOwnerMismatch(parent.id.to_string()));
    }
    if !parent.status.is_active() {
        return Err(OrderingError::ParentArchived(parent.id.to_string()));
    }
    if child.kind != parent.kind {
        return Err(OrderingError::ParentTypeMismatch {
            parent: parent.kind.to_string(),
            child: child.kind.to_string(),
        });
    }
    if parent.parent.is_some() {
        return Err(OrderingError::ParentAlreadyNested(parent.id.to_string()));
    }
    if child.child_count > 0 {
        return Err(OrderingError::ChildHasChildren(child.id.to_string()));
    }
    Ok(())
}
