//! Property-based tests for ordering groups.
//!
//! Any sequence of creates, archives, reactivations, relocations and full
//! reorders leaves every active group numbered exactly `0..n`.

use proptest::prelude::*;

use super::archive::ArchivalCoordinator;
use super::reorder::{OrderNode, ReorderValidator, TreeNode};
use super::sequencer::OrderSequencer;
use super::types::fixtures::Item;
use super::types::{EntityStatus, OrderWrite, PlacementWrite, Position};

#[derive(Debug, Clone)]
enum Op {
    Create,
    Archive(usize),
    Reactivate(usize),
    Relocate(usize, usize),
    Reverse,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Create),
        2 => any::<usize>().prop_map(Op::Archive),
        1 => any::<usize>().prop_map(Op::Reactivate),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Relocate(a, b)),
        1 => Just(Op::Reverse),
    ]
}

/// In-memory stand-in for a persisted flat group.
#[derive(Default)]
struct Store {
    items: Vec<Item>,
    next_id: u32,
}

impl Store {
    fn active(&self) -> Vec<Item> {
        self.items
            .iter()
            .filter(|i| i.status.is_active())
            .cloned()
            .collect()
    }

    fn archived_ids(&self) -> Vec<u32> {
        self.items
            .iter()
            .filter(|i| !i.status.is_active())
            .map(|i| i.id)
            .collect()
    }

    fn get_mut(&mut self, id: u32) -> &mut Item {
        self.items.iter_mut().find(|i| i.id == id).unwrap()
    }

    fn apply(&mut self, writes: &[OrderWrite<u32>]) {
        for write in writes {
            self.get_mut(write.id).order = Some(write.order);
        }
    }

    fn run(&mut self, op: &Op) {
        let active = self.active();
        match op {
            Op::Create => {
                let order = OrderSequencer::append_position(active.len());
                self.next_id += 1;
                self.items.push(Item::active(self.next_id, order));
            }
            Op::Archive(pick) if !active.is_empty() => {
                let target = &active[pick % active.len()];
                let plan = ArchivalCoordinator::plan(target, &active).unwrap();
                let item = self.get_mut(plan.archived);
                item.status = EntityStatus::Archived;
                item.order = None;
                self.apply(&plan.sibling_writes);
            }
            Op::Reactivate(pick) => {
                let archived = self.archived_ids();
                if archived.is_empty() {
                    return;
                }
                let id = archived[pick % archived.len()];
                let entity = self.get_mut(id).clone();
                let order = ArchivalCoordinator::reactivation_position(&entity, active.len()).unwrap();
                let item = self.get_mut(id);
                item.status = EntityStatus::Active;
                item.order = Some(order);
            }
            Op::Relocate(pick, target) if !active.is_empty() => {
                let moving = active[pick % active.len()].id;
                let target = Position::try_from(target % active.len()).unwrap();
                let writes = OrderSequencer::relocate(&active, moving, target).unwrap();
                self.apply(&writes);
            }
            Op::Reverse => {
                let size = active.len();
                let nodes: Vec<OrderNode<u32>> = active
                    .iter()
                    .map(|i| OrderNode {
                        id: i.id,
                        order: Position::try_from(size).unwrap() - 1 - i.order.unwrap(),
                    })
                    .collect();
                let ids: Vec<u32> = active.iter().map(|i| i.id).collect();
                let writes = ReorderValidator::validate_flat(&nodes, &ids).unwrap();
                self.apply(&writes);
            }
            _ => {}
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Flat groups stay dense under any operation sequence.
    #[test]
    fn prop_flat_group_stays_dense(ops in prop::collection::vec(op(), 1..60)) {
        let mut store = Store::default();
        for op in &ops {
            store.run(op);
            let active = store.active();
            prop_assert!(OrderSequencer::is_dense(active.iter().filter_map(|i| i.order)));
            prop_assert!(store.items.iter().filter(|i| !i.status.is_active()).all(|i| i.order.is_none()));
        }
    }

    /// Archiving a root with children keeps the root level dense.
    #[test]
    fn prop_archiving_parent_keeps_root_dense(
        roots in 1usize..8,
        children in 0usize..6,
        pick in any::<usize>(),
    ) {
        let root_items: Vec<Item> = (0..roots)
            .map(|i| Item::active(u32::try_from(i).unwrap(), Position::try_from(i).unwrap()))
            .collect();
        let parent = &root_items[pick % roots];
        let child_items: Vec<Item> = (0..children)
            .map(|i| {
                Item::active(100 + u32::try_from(i).unwrap(), Position::try_from(i).unwrap())
                    .child_of(parent.id)
            })
            .collect();

        let plan = ArchivalCoordinator::plan_with_children(parent, &root_items, Some(child_items.as_slice())).unwrap();

        let root_orders = plan
            .sibling_writes
            .iter()
            .map(|w| w.order)
            .chain(plan.detached_children.iter().map(|w| w.order));
        prop_assert!(OrderSequencer::is_dense(root_orders));
        prop_assert_eq!(plan.sibling_writes.len() + plan.detached_children.len(), roots - 1 + children);
        prop_assert!(plan.detached_children.iter().all(|w| w.parent.is_none()));
    }

    /// Any accepted tree reorder yields dense levels.
    #[test]
    fn prop_accepted_tree_is_dense(shape in prop::collection::vec(0usize..4, 1..6)) {
        let mut next = 0u32;
        let mut active = Vec::new();
        let nodes: Vec<TreeNode<u32>> = shape
            .iter()
            .enumerate()
            .map(|(order, &kids)| {
                next += 1;
                let id = next;
                active.push(id);
                let child_nodes = (0..kids)
                    .rev()
                    .map(|child_order| {
                        next += 1;
                        active.push(next);
                        OrderNode { id: next, order: Position::try_from(child_order).unwrap() }
                    })
                    .collect();
                TreeNode { id, order: Position::try_from(order).unwrap(), child_nodes }
            })
            .collect();

        let writes: Vec<PlacementWrite<u32>> = ReorderValidator::validate_tree(&nodes, &active).unwrap();

        prop_assert_eq!(writes.len(), active.len());
        prop_assert!(OrderSequencer::is_dense(writes.iter().filter(|w| w.parent.is_none()).map(|w| w.order)));
        for node in &nodes {
            prop_assert!(OrderSequencer::is_dense(
                writes.iter().filter(|w| w.parent == Some(node.id)).map(|w| w.order)
            ));
        }
    }
}
