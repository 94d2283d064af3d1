//! # pathyvo-core
//!
//! The roadmap engine for Pathyvo - THE LOGIC.
//!
//! A roadmap is an ordered list of milestones returned by the backend. This
//! crate turns that list into display nodes carrying
//! `completed` / `current` / `available` / `locked` status, gates which node
//! may be completed next, and computes the summaries shown on the dashboard,
//! analytics and achievements views.
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Never mutates derived state; nodes are re-derived from fresh milestones
//! - Trusts backend counters (`progress`, `completed_milestones`) as authoritative
//! - Integer arithmetic only

// =============================================================================
// MODULES
// =============================================================================

pub mod achievement;
pub mod activity;
pub mod conversation;
pub mod deriver;
pub mod primitives;
pub mod progress;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    LoginResponse, Milestone, MilestoneId, NodeResource, NodeStatus, PathyvoError, Resource,
    ResourceKind, Roadmap, RoadmapId, RoadmapNode, User, UserId,
};

// =============================================================================
// RE-EXPORTS: Derivation & Gating
// =============================================================================

pub use deriver::{
    NodeTally, check_completable, current_node, derive_nodes, is_unlocked, validate_rename,
};

// =============================================================================
// RE-EXPORTS: Summaries
// =============================================================================

pub use achievement::{
    Achievement, AchievementBoard, AchievementTile, ColorScheme, UserAchievement,
    category_display_name,
};
pub use activity::{ActivityEntry, ActivityKind, RecentMilestone, build_activity_log};
pub use conversation::{
    ChatMessage, Conversation, ConversationStage, ConversationState, MentorReply,
    RoadmapConversation, Sender, StoredMessage,
};
pub use progress::{AnalyticsSummary, CategoryCount, DashboardStats, ProgressBand, WeeklyCount};
