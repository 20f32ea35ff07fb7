//! Validation of caller-submitted target orders.
//!
//! A reorder request must describe the whole active set: every active id
//! exactly once, and every level numbered `0..n`. Checks run in a fixed
//! order (duplicate ids, then completeness, then per-level density) so the
//! reported error is deterministic.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::error::OrderingError;
use super::types::{OrderWrite, PlacementWrite, Position, position_at};

/// A submitted `{id, order}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNode<Id> {
    /// Entity id.
    pub id: Id,
    /// Target position within its level.
    pub order: Position,
}

/// A submitted root-level node with optional children (two levels only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode<Id> {
    /// Entity id.
    pub id: Id,
    /// Target position among root-level nodes.
    pub order: Position,
    /// Children placed under this node.
    #[serde(default)]
    pub child_nodes: Vec<OrderNode<Id>>,
}

/// Gate run before a reorder is applied.
pub struct ReorderValidator;

impl ReorderValidator {
    /// Validates a flat reorder (accounts) against the active group.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: `DuplicateNode`, `NodesNotFound`,
    /// `NodesMissing`, `DuplicateOrder` or `OrderGap`.
    pub fn validate_flat<Id>(
        nodes: &[OrderNode<Id>],
        active: &[Id],
    ) -> Result<Vec<OrderWrite<Id>>, OrderingError>
    where
        Id: Copy + Eq + Hash + Display,
    {
        check_duplicate_ids(nodes.iter().map(|n| n.id))?;
        check_completeness(nodes.iter().map(|n| n.id), active)?;
        check_level(None::<Id>, nodes.iter().map(|n| (n.id, n.order)))?;

        Ok(nodes
            .iter()
            .map(|n| OrderWrite {
                id: n.id,
                order: n.order,
            })
            .collect())
    }

    /// Validates a nested reorder (categories) against the active set of one type.
    ///
    /// On success returns one placement per submitted node: root nodes with
    /// no parent, children with the parent they were submitted under.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate_flat`]; level errors on nested levels name
    /// the owning parent.
    pub fn validate_tree<Id>(
        nodes: &[TreeNode<Id>],
        active: &[Id],
    ) -> Result<Vec<PlacementWrite<Id>>, OrderingError>
    where
        Id: Copy + Eq + Hash + Display,
    {
        check_duplicate_ids(flatten(nodes))?;
        check_completeness(flatten(nodes), active)?;

        check_level(None::<Id>, nodes.iter().map(|n| (n.id, n.order)))?;
        for node in nodes.iter().filter(|n| !n.child_nodes.is_empty()) {
            check_level(
                Some(node.id),
                node.child_nodes.iter().map(|c| (c.id, c.order)),
            )?;
        }

        let mut writes = Vec::new();
        for node in nodes {
            writes.push(PlacementWrite {
                id: node.id,
                order: node.order,
                parent: None,
            });
            writes.extend(node.child_nodes.iter().map(|child| PlacementWrite {
                id: child.id,
                order: child.order,
                parent: Some(node.id),
            }));
        }
        Ok(writes)
    }
}

/// Parent-first traversal of every submitted id.
fn flatten<Id: Copy>(nodes: &[TreeNode<Id>]) -> impl Iterator<Item = Id> + '_ {
    nodes.iter().flat_map(|node| {
        std::iter::once(node.id).chain(node.child_nodes.iter().map(|child| child.id))
    })
}

fn check_duplicate_ids<Id>(ids: impl Iterator<Item = Id>) -> Result<(), OrderingError>
where
    Id: Eq + Hash + Display,
{
    let mut seen = HashSet::new();
    for id in ids {
        if seen.contains(&id) {
            return Err(OrderingError::DuplicateNode(id.to_string()));
        }
        seen.insert(id);
    }
    Ok(())
}

fn check_completeness<Id>(
    submitted: impl Iterator<Item = Id>,
    active: &[Id],
) -> Result<(), OrderingError>
where
    Id: Copy + Eq + Hash + Display,
{
    let active_set: HashSet<Id> = active.iter().copied().collect();
    let submitted: Vec<Id> = submitted.collect();

    let unknown: Vec<String> = submitted
        .iter()
        .filter(|id| !active_set.contains(*id))
        .map(ToString::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(OrderingError::NodesNotFound { ids: unknown });
    }

    let submitted_set: HashSet<Id> = submitted.into_iter().collect();
    let missing: Vec<String> = active
        .iter()
        .filter(|id| !submitted_set.contains(*id))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(OrderingError::NodesMissing { ids: missing });
    }

    Ok(())
}

/// Checks that one level's orders are exactly `0..n`.
fn check_level<Id>(
    parent: Option<Id>,
    level: impl Iterator<Item = (Id, Position)>,
) -> Result<(), OrderingError>
where
    Id: Copy + Display,
{
    let parent_name = || parent.map(|p| p.to_string());
    let mut claimed: BTreeMap<Position, Id> = BTreeMap::new();
    let mut size = 0usize;

    for (id, order) in level {
        size += 1;
        if let Some(first) = claimed.get(&order) {
            return Err(OrderingError::DuplicateOrder {
                parent: parent_name(),
                order,
                first: first.to_string(),
                second: id.to_string(),
            });
        }
        claimed.insert(order, id);
    }

    let missing: Vec<Position> = (0..size)
        .map(position_at)
        .filter(|order| !claimed.contains_key(order))
        .collect();
    if !missing.is_empty() {
        return Err(OrderingError::OrderGap {
            parent: parent_name(),
            missing,
        });
    }

    Ok(())
}
