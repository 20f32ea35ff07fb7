//! Dense sibling ordering for accounts and transaction categories.
//!
//! Every active entity belongs to exactly one ordering group (per user and
//! type for accounts, per user, type and parent for categories) and the
//! `order` values of a group always form `0..n`. This module holds the pure
//! pieces that keep that true:
//! - `sequencer` - append positions and renumbering
//! - `reorder` - validation of caller-submitted target orders
//! - `archive` - write plans for archiving, removal and re-activation
//! - `hierarchy` - two-level parent/child rules for categories
//!
//! Nothing here performs I/O. Callers apply the returned writes inside one
//! database transaction.

pub mod archive;
pub mod error;
pub mod hierarchy;
pub mod reorder;
pub mod sequencer;
pub mod types;

#[cfg(test)]
mod sequencer_props;

pub use archive::{ArchivalCoordinator, ArchivePlan};
pub use error::OrderingError;
pub use hierarchy::{HierarchyNode, validate_parent_assignment};
pub use reorder::{OrderNode, ReorderValidator, TreeNode};
pub use sequencer::{OrderSequencer, ensure_capacity};
pub use types::{EntityStatus, Nested, OrderWrite, Ordered, PlacementWrite, Position};
