//! Errors raised while planning structural changes to ordering groups.

use thiserror::Error;

use super::types::Position;
use crate::error::ErrorKind;

/// Errors that can occur while validating or planning ordering changes.
///
/// Ids are carried in their display form so one error type serves both
/// accounts and categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingError {
    // ========== Reorder Validation ==========
    /// The same id was submitted more than once.
    #[error("Node {0} is submitted more than once")]
    DuplicateNode(String),

    /// Submitted ids that are not part of the active set.
    #[error("Nodes not found: {}", .ids.join(", "))]
    NodesNotFound {
        /// The unmatched submitted ids.
        ids: Vec<String>,
    },

    /// Active ids that the submission left out.
    #[error("Reorder must include every active node; missing: {}", .ids.join(", "))]
    NodesMissing {
        /// The active ids absent from the submission.
        ids: Vec<String>,
    },

    /// Two ids claim the same position in one level.
    #[error("Order {order} is used by both {first} and {second}{}", level_suffix(.parent.as_deref()))]
    DuplicateOrder {
        /// Owning parent for nested levels.
        parent: Option<String>,
        /// The contested position.
        order: Position,
        /// First id holding the position.
        first: String,
        /// Second id holding the position.
        second: String,
    },

    /// Positions missing from a level.
    #[error("Order sequence has gaps, missing {missing:?}{}", level_suffix(.parent.as_deref()))]
    OrderGap {
        /// Owning parent for nested levels.
        parent: Option<String>,
        /// Positions in `0..n` that nobody claimed.
        missing: Vec<Position>,
    },

    // ========== Lifecycle ==========
    /// The entity is already archived.
    #[error("{0} is archived")]
    AlreadyArchived(String),

    /// Re-activation requested for an entity that is already active.
    #[error("{0} is not archived")]
    NotArchived(String),

    /// Creating or re-activating would exceed the per-user limit.
    #[error("Limit of {limit} active entries per user reached")]
    CapacityExceeded {
        /// The configured limit.
        limit: u64,
    },

    /// Moving to a position outside the group.
    #[error("Position {order} is outside the group of {size}")]
    PositionOutOfRange {
        /// Requested position.
        order: Position,
        /// Size of the group.
        size: usize,
    },

    // ========== Hierarchy ==========
    /// The requested parent does not exist for this user.
    #[error("Parent category not found: {0}")]
    ParentNotFound(String),

    /// A category cannot be its own parent.
    #[error("Category {0} cannot be its own parent")]
    SelfParent(String),

    /// Parent and child belong to different users.
    #[error("Parent {0} belongs to a different user")]
    ParentOwnerMismatch(String),

    /// Parent and child have different types.
    #[error("Parent type {parent} does not match child type {child}")]
    ParentTypeMismatch {
        /// Parent type.
        parent: String,
        /// Child type.
        child: String,
    },

    /// The requested parent is itself nested.
    #[error("Parent {0} is already nested under another category")]
    ParentAlreadyNested(String),

    /// The requested parent is archived.
    #[error("Parent {0} is archived")]
    ParentArchived(String),

    /// A category with children cannot become a child.
    #[error("Category {0} has children and cannot be nested")]
    ChildHasChildren(String),

    // ========== Internal ==========
    /// The caller did not load the children relation.
    #[error("Children of {0} were not loaded")]
    ChildrenNotLoaded(String),

    /// A nested entity reports children of its own.
    #[error("{0} has both a parent and children")]
    NestedParent(String),
}

fn level_suffix(parent: Option<&str>) -> String {
    parent.map(|p| format!(" under parent {p}")).unwrap_or_default()
}

impl OrderingError {
    /// Returns the abstract error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NodesNotFound { .. } | Self::ParentNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyArchived(_) => ErrorKind::Forbidden,
            Self::CapacityExceeded { .. }
            | Self::SelfParent(_)
            | Self::ParentOwnerMismatch(_)
            | Self::ParentTypeMismatch { .. }
            | Self::ParentAlreadyNested(_)
            | Self::ParentArchived(_)
            | Self::ChildHasChildren(_) => ErrorKind::Conflict,
            Self::DuplicateNode(_)
            | Self::NodesMissing { .. }
            | Self::DuplicateOrder { .. }
            | Self::OrderGap { .. }
            | Self::NotArchived(_)
            | Self::PositionOutOfRange { .. } => ErrorKind::InvalidRequest,
            Self::ChildrenNotLoaded(_) | Self::NestedParent(_) => ErrorKind::InternalInconsistency,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateNode(_) => "DUPLICATE_NODE",
            Self::NodesNotFound { .. } => "NODES_NOT_FOUND",
            Self::NodesMissing { .. } => "NODES_MISSING",
            Self::DuplicateOrder { .. } => "DUPLICATE_ORDER",
            Self::OrderGap { .. } => "ORDER_GAP",
            Self::AlreadyArchived(_) => "ALREADY_ARCHIVED",
            Self::NotArchived(_) => "NOT_ARCHIVED",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::PositionOutOfRange { .. } => "POSITION_OUT_OF_RANGE",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::SelfParent(_) => "SELF_PARENT",
            Self::ParentOwnerMismatch(_) => "PARENT_OWNER_MISMATCH",
            Self::ParentTypeMismatch { .. } => "PARENT_TYPE_MISMATCH",
            Self::ParentAlreadyNested(_) => "PARENT_ALREADY_NESTED",
            Self::ParentArchived(_) => "PARENT_ARCHIVED",
            Self::ChildHasChildren(_) => "CHILD_HAS_CHILDREN",
            Self::ChildrenNotLoaded(_) => "CHILDREN_NOT_LOADED",
            Self::NestedParent(_) => "NESTED_PARENT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidRequest => 400,
            ErrorKind::InternalInconsistency => 500,
        }
    }
}
