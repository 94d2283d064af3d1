//! # Node-State Deriver
//!
//! Turns an ordered milestone list into display nodes.
//!
//! ## Derivation Rule
//!
//! For milestones `m[0..n]`, node `i` is:
//! - `completed` iff `m[i].completed`
//! - `current` iff `!m[i].completed && (i == 0 || m[i - 1].completed)`
//! - `available` under the same predicate as `current`
//! - locked otherwise
//!
//! ## State Machine
//!
//! ```text
//! LOCKED ──(predecessor completed)──► CURRENT/AVAILABLE ──(server confirms)──► COMPLETED
//! ```
//!
//! `COMPLETED` is terminal. Nodes never transition locally: a transition is
//! observed by re-fetching milestones and deriving again.

use crate::types::{
    Milestone, MilestoneId, NodeResource, NodeStatus, PathyvoError, Resource, ResourceKind,
    Roadmap, RoadmapNode,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// DERIVATION
// =============================================================================

/// Whether milestone `index` is the next one to work on.
///
/// Returns `false` for an out-of-range index.
#[must_use]
pub fn is_unlocked(milestones: &[Milestone], index: usize) -> bool {
    let Some(milestone) = milestones.get(index) else {
        return false;
    };
    if milestone.completed {
        return false;
    }
    match index.checked_sub(1) {
        None => true,
        Some(prev) => milestones.get(prev).is_some_and(|p| p.completed),
    }
}

impl From<&Resource> for NodeResource {
    fn from(resource: &Resource) -> Self {
        NodeResource {
            title: resource.title().to_string(),
            kind: ResourceKind::Article,
            url: resource.url().map(str::to_string),
        }
    }
}

/// Derive display nodes from an ordered milestone list.
///
/// Output has the same length and order as the input. Fields the backend
/// does not provide (`category`, `skills`, `estimated_duration`,
/// `prerequisites`) are left empty.
#[must_use]
pub fn derive_nodes(milestones: &[Milestone]) -> Vec<RoadmapNode> {
    milestones
        .iter()
        .enumerate()
        .map(|(index, milestone)| {
            let unlocked = is_unlocked(milestones, index);
            RoadmapNode {
                id: milestone.id,
                title: milestone.title.clone(),
                description: milestone.description.clone(),
                category: String::new(),
                completed: milestone.completed,
                current: unlocked,
                // Same predicate as `current`. The backend has no separate
                // notion of an available-but-not-current milestone.
                available: unlocked,
                skills: Vec::new(),
                estimated_duration: String::new(),
                prerequisites: Vec::new(),
                resources: milestone.resources.iter().map(NodeResource::from).collect(),
            }
        })
        .collect()
}

impl Roadmap {
    /// Replace `roadmap_nodes` with nodes derived from `milestones`.
    #[must_use]
    pub fn with_derived_nodes(mut self) -> Self {
        self.roadmap_nodes = derive_nodes(&self.milestones);
        self
    }
}

/// The node the user should work on next, if any.
#[must_use]
pub fn current_node(nodes: &[RoadmapNode]) -> Option<&RoadmapNode> {
    nodes.iter().find(|n| n.status() == NodeStatus::Current)
}

// =============================================================================
// GATING
// =============================================================================

/// Check that a milestone may be completed now.
///
/// Only the node in `Current` (or `Available`) status exposes the completion
/// action. Completion is terminal, so completed nodes are rejected too.
pub fn check_completable(
    nodes: &[RoadmapNode],
    milestone: MilestoneId,
) -> Result<&RoadmapNode, PathyvoError> {
    let node = nodes
        .iter()
        .find(|n| n.id == milestone)
        .ok_or(PathyvoError::MilestoneNotFound(milestone))?;

    match node.status() {
        NodeStatus::Current | NodeStatus::Available => Ok(node),
        NodeStatus::Completed => Err(PathyvoError::MilestoneAlreadyCompleted(milestone)),
        NodeStatus::Locked => Err(PathyvoError::MilestoneLocked(milestone)),
    }
}

/// Validate a rename request and return the trimmed title to send.
pub fn validate_rename(current_title: &str, requested: &str) -> Result<String, PathyvoError> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(PathyvoError::EmptyTitle);
    }
    if trimmed == current_title {
        return Err(PathyvoError::UnchangedTitle);
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// NODE TALLY
// =============================================================================

/// Per-status node counts shown in the roadmap legend.
///
/// `current` and `available` are counted independently, so a node can add
/// to both. `locked` counts nodes that are none of the three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeTally {
    pub completed: usize,
    pub current: usize,
    pub available: usize,
    pub locked: usize,
}

impl NodeTally {
    #[must_use]
    pub fn from_nodes(nodes: &[RoadmapNode]) -> Self {
        nodes.iter().fold(Self::default(), |mut tally, node| {
            if node.completed {
                tally.completed += 1;
            }
            if node.current {
                tally.current += 1;
            }
            if node.available {
                tally.available += 1;
            }
            if !node.completed && !node.current && !node.available {
                tally.locked += 1;
            }
            tally
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
