//! # Property-Based Tests
//!
//! Invariants of node derivation over arbitrary milestone lists.

use pathyvo_core::{Milestone, MilestoneId, NodeStatus, current_node, derive_nodes};
use proptest::collection::vec;
use proptest::prelude::*;

fn milestones_from(flags: &[bool]) -> Vec<Milestone> {
    flags
        .iter()
        .enumerate()
        .map(|(i, &done)| {
            Milestone::new(MilestoneId(i as u64 * 10 + 1), format!("Milestone {i}"))
                .with_description(format!("Step {i} of the path"))
                .with_completed(done)
        })
        .collect()
}

proptest! {
    /// Length, order, ids, titles and descriptions carry over unchanged.
    #[test]
    fn derivation_preserves_identity(flags in vec(any::<bool>(), 0..40)) {
        let milestones = milestones_from(&flags);
        let nodes = derive_nodes(&milestones);

        prop_assert_eq!(nodes.len(), milestones.len());
        for (node, milestone) in nodes.iter().zip(&milestones) {
            prop_assert_eq!(node.id, milestone.id);
            prop_assert_eq!(&node.title, &milestone.title);
            prop_assert_eq!(&node.description, &milestone.description);
            prop_assert_eq!(node.completed, milestone.completed);
        }
    }

    /// The first node is current exactly when the first milestone is open.
    #[test]
    fn first_node_current_iff_incomplete(flags in vec(any::<bool>(), 1..40)) {
        let nodes = derive_nodes(&milestones_from(&flags));
        prop_assert_eq!(nodes[0].current, !flags[0]);
    }

    /// Later nodes are current exactly when open with a completed predecessor.
    #[test]
    fn predecessor_rule(flags in vec(any::<bool>(), 2..40)) {
        let nodes = derive_nodes(&milestones_from(&flags));
        for i in 1..nodes.len() {
            prop_assert_eq!(nodes[i].current, !flags[i] && flags[i - 1]);
            prop_assert_eq!(nodes[i].available, nodes[i].current);
        }
    }

    /// A completed prefix followed by open milestones has exactly one current
    /// node, at the end of the prefix; a fully completed list has none.
    #[test]
    fn prefix_completion_has_single_current(len in 0usize..40, done in 0usize..40) {
        let done = done.min(len);
        let flags: Vec<bool> = (0..len).map(|i| i < done).collect();
        let nodes = derive_nodes(&milestones_from(&flags));

        let current: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.current)
            .map(|(i, _)| i)
            .collect();
        if done == len {
            prop_assert!(current.is_empty());
            prop_assert!(current_node(&nodes).is_none());
        } else {
            prop_assert_eq!(current, vec![done]);
            prop_assert_eq!(current_node(&nodes).map(|n| n.id), Some(nodes[done].id));
        }
    }

    /// Deriving twice yields identical nodes.
    #[test]
    fn derivation_is_idempotent(flags in vec(any::<bool>(), 0..40)) {
        let milestones = milestones_from(&flags);
        prop_assert_eq!(derive_nodes(&milestones), derive_nodes(&milestones));
    }

    /// Every node has exactly one status and it follows the precedence order.
    #[test]
    fn status_follows_flags(flags in vec(any::<bool>(), 0..40)) {
        for node in derive_nodes(&milestones_from(&flags)) {
            let expected = if node.completed {
                NodeStatus::Completed
            } else if node.current {
                NodeStatus::Current
            } else {
                NodeStatus::Locked
            };
            prop_assert_eq!(node.status(), expected);
        }
    }
}
