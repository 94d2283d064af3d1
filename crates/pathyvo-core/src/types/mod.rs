//! # Core Type Definitions
//!
//! This module contains the data model shared by the deriver and the client:
//! - Identifiers (`RoadmapId`, `MilestoneId`, `UserId`)
//! - Backend records (`Roadmap`, `Milestone`, `Resource`, `User`, `LoginResponse`)
//! - Derived view records (`RoadmapNode`, `NodeResource`, `NodeStatus`)
//! - Error types (`PathyvoError`)
//!
//! ## Wire Tolerance
//!
//! The backend emits snake_case JSON with nullable optional columns. Older
//! payloads used camelCase. Deserialization accepts both spellings, maps
//! `null` collections and strings to their empty value, and treats a missing
//! or malformed milestone list as empty.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Backend identifier of a roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoadmapId(pub u64);

/// Backend identifier of a milestone.
///
/// A derived `RoadmapNode` carries the id of the milestone it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MilestoneId(pub u64);

/// Backend identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for RoadmapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// DESERIALIZATION HELPERS
// =============================================================================

/// Deserialize a nullable value, mapping `null` to `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MilestoneList {
    List(Vec<Milestone>),
    Malformed(serde::de::IgnoredAny),
}

/// A milestone list that is `null`, not an array, or contains entries that
/// are not milestones becomes an empty list.
fn lenient_milestones<'de, D>(deserializer: D) -> Result<Vec<Milestone>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match MilestoneList::deserialize(deserializer)? {
        MilestoneList::List(milestones) => milestones,
        MilestoneList::Malformed(_) => Vec::new(),
    })
}

// =============================================================================
// RESOURCE
// =============================================================================

/// A learning resource attached to a milestone.
///
/// The backend stores resources either as bare titles or as `{title, url}`
/// objects, sometimes mixed within one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    /// A bare title with no link.
    Title(String),
    /// A titled link. `url` may be absent.
    Link {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl Resource {
    /// Resource title, regardless of shape.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Resource::Title(title) | Resource::Link { title, .. } => title,
        }
    }

    /// Resource URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Resource::Title(_) => None,
            Resource::Link { url, .. } => url.as_deref(),
        }
    }
}

// =============================================================================
// MILESTONE
// =============================================================================

/// A single linear step within a roadmap.
///
/// Identity is immutable. `completed` only changes through a
/// server-confirmed completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, alias = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<Resource>,
}

impl Milestone {
    /// Create an incomplete milestone with no resources.
    #[must_use]
    pub fn new(id: MilestoneId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            completed: false,
            due_date: None,
            resources: Vec::new(),
        }
    }

    /// Builder-style setter for the completion flag.
    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Builder-style setter for the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style setter for resources.
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }
}

// =============================================================================
// ROADMAP
// =============================================================================

/// A named, ordered sequence of milestones for one user.
///
/// `progress`, `completed_milestones` and `total_milestones` are computed by
/// the backend and never recomputed here. `roadmap_nodes` is never read from
/// the wire; it is filled by [`Roadmap::with_derived_nodes`](crate::deriver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: RoadmapId,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: u8,
    #[serde(default, alias = "nextMilestone")]
    pub next_milestone: Option<String>,
    #[serde(
        default,
        alias = "totalMilestones",
        deserialize_with = "null_as_default"
    )]
    pub total_milestones: u32,
    #[serde(
        default,
        alias = "completedMilestones",
        deserialize_with = "null_as_default"
    )]
    pub completed_milestones: u32,
    #[serde(default, alias = "estimatedTimeToComplete")]
    pub estimated_time_to_complete: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_milestones")]
    pub milestones: Vec<Milestone>,
    #[serde(default, rename = "roadmapNodes", skip_deserializing)]
    pub roadmap_nodes: Vec<RoadmapNode>,
}

impl Roadmap {
    /// Create an empty roadmap with the given id and title.
    #[must_use]
    pub fn new(id: RoadmapId, title: impl Into<String>) -> Self {
        Self {
            id,
            user_id: None,
            title: title.into(),
            description: String::new(),
            field: None,
            progress: 0,
            next_milestone: None,
            total_milestones: 0,
            completed_milestones: 0,
            estimated_time_to_complete: None,
            created_at: None,
            milestones: Vec::new(),
            roadmap_nodes: Vec::new(),
        }
    }

    /// Field label, or `None` when the backend left it blank.
    #[must_use]
    pub fn field_label(&self) -> Option<&str> {
        self.field.as_deref().filter(|f| !f.trim().is_empty())
    }

    /// Find a milestone by id.
    #[must_use]
    pub fn milestone(&self, id: MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }
}

// =============================================================================
// DERIVED NODE
// =============================================================================

/// Kind tag of a node resource. Milestone resources always map to `Article`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Article,
    Video,
    Course,
    Book,
    Practice,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Article => "article",
            ResourceKind::Video => "video",
            ResourceKind::Course => "course",
            ResourceKind::Book => "book",
            ResourceKind::Practice => "practice",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized resource on a derived node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResource {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Display status of a node, read with precedence
/// completed > current > available > locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Completed,
    Current,
    Available,
    Locked,
}

impl NodeStatus {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            NodeStatus::Completed => "Completed",
            NodeStatus::Current => "Current",
            NodeStatus::Available => "Available",
            NodeStatus::Locked => "Locked",
        }
    }

    /// Locked nodes cannot be selected or acted on.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        !matches!(self, NodeStatus::Locked)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A derived, display-oriented view of a milestone.
///
/// Never persisted and never mutated in place. Produced by
/// [`derive_nodes`](crate::deriver::derive_nodes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapNode {
    pub id: MilestoneId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub completed: bool,
    pub current: bool,
    pub available: bool,
    pub skills: Vec<String>,
    pub estimated_duration: String,
    pub prerequisites: Vec<String>,
    pub resources: Vec<NodeResource>,
}

impl RoadmapNode {
    /// Status with completed > current > available > locked precedence.
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        if self.completed {
            NodeStatus::Completed
        } else if self.current {
            NodeStatus::Current
        } else if self.available {
            NodeStatus::Available
        } else {
            NodeStatus::Locked
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.status() == NodeStatus::Locked
    }
}

// =============================================================================
// USER & AUTH
// =============================================================================

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(
        default,
        alias = "joinedAt",
        alias = "join_date",
        alias = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub joined_at: Option<String>,
}

/// Response body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl LoginResponse {
    /// The user described by this login response.
    #[must_use]
    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            name: self.user_name.clone(),
            email: self.user_email.clone(),
            avatar: None,
            joined_at: None,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by core validation and gating.
///
/// Derivation itself never fails; these come from the state-machine gates
/// and input checks that run before a request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathyvoError {
    /// The milestone is not part of the roadmap.
    #[error("Milestone not found: {0}")]
    MilestoneNotFound(MilestoneId),

    /// The milestone's predecessor is not complete yet.
    #[error("Milestone {0} is locked until the previous milestone is completed")]
    MilestoneLocked(MilestoneId),

    /// The milestone is already complete; completion is terminal.
    #[error("Milestone {0} is already completed")]
    MilestoneAlreadyCompleted(MilestoneId),

    /// A rename was requested with a blank title.
    #[error("Title cannot be empty")]
    EmptyTitle,

    /// A rename was requested with the current title.
    #[error("Please enter a different title")]
    UnchangedTitle,

    /// A chat message was blank after trimming.
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// A chat message was sent while the mentor reply is pending.
    #[error("The mentor is still replying")]
    AwaitingReply,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_roadmap(json: &str) -> Roadmap {
        serde_json::from_str(json).expect("roadmap json")
    }

    #[test]
    fn milestone_accepts_null_description_and_resources() {
        let m: Milestone = serde_json::from_str(
            r#"{"id": 3, "title": "Git", "description": null, "completed": false, "resources": null}"#,
        )
        .expect("milestone");
        assert_eq!(m.description, "");
        assert!(m.resources.is_empty());
    }

    #[test]
    fn milestone_accepts_camel_case_due_date() {
        let m: Milestone =
            serde_json::from_str(r#"{"id": 1, "title": "A", "dueDate": "2025-01-01"}"#)
                .expect("milestone");
        assert_eq!(m.due_date.as_deref(), Some("2025-01-01"));
        assert!(!m.completed);
    }

    #[test]
    fn resource_shapes() {
        let resources: Vec<Resource> = serde_json::from_str(
            r#"["MDN Web Docs", {"title": "Rust Book", "url": "https://doc.rust-lang.org/book/"}, {"title": "Notes"}]"#,
        )
        .expect("resources");
        assert_eq!(resources[0], Resource::Title("MDN Web Docs".into()));
        assert_eq!(resources[1].url(), Some("https://doc.rust-lang.org/book/"));
        assert_eq!(resources[2].title(), "Notes");
        assert_eq!(resources[2].url(), None);
    }

    #[test]
    fn roadmap_accepts_both_spellings() {
        let snake = parse_roadmap(
            r#"{"id": 1, "title": "Rust", "total_milestones": 4, "completed_milestones": 2, "progress": 50}"#,
        );
        let camel = parse_roadmap(
            r#"{"id": 1, "title": "Rust", "totalMilestones": 4, "completedMilestones": 2, "progress": 50}"#,
        );
        assert_eq!(snake.total_milestones, 4);
        assert_eq!(camel.total_milestones, 4);
        assert_eq!(snake.completed_milestones, camel.completed_milestones);
    }

    #[test]
    fn roadmap_missing_or_malformed_milestones_is_empty() {
        assert!(parse_roadmap(r#"{"id": 1, "title": "A"}"#).milestones.is_empty());
        assert!(
            parse_roadmap(r#"{"id": 1, "title": "A", "milestones": null}"#)
                .milestones
                .is_empty()
        );
        assert!(
            parse_roadmap(r#"{"id": 1, "title": "A", "milestones": "oops"}"#)
                .milestones
                .is_empty()
        );
        assert!(
            parse_roadmap(r#"{"id": 1, "title": "A", "milestones": [{"bogus": true}]}"#)
                .milestones
                .is_empty()
        );
    }

    #[test]
    fn roadmap_ignores_client_side_nodes_on_input() {
        let roadmap = parse_roadmap(
            r#"{"id": 1, "title": "A", "roadmapNodes": [{"id": 9}], "milestones": []}"#,
        );
        assert!(roadmap.roadmap_nodes.is_empty());
    }

    #[test]
    fn node_status_precedence() {
        let mut node = RoadmapNode {
            id: MilestoneId(1),
            title: String::new(),
            description: String::new(),
            category: String::new(),
            completed: false,
            current: true,
            available: true,
            skills: vec![],
            estimated_duration: String::new(),
            prerequisites: vec![],
            resources: vec![],
        };
        assert_eq!(node.status(), NodeStatus::Current);
        node.current = false;
        assert_eq!(node.status(), NodeStatus::Available);
        node.available = false;
        assert_eq!(node.status(), NodeStatus::Locked);
        assert!(!node.status().is_interactive());
        node.completed = true;
        assert_eq!(node.status(), NodeStatus::Completed);
    }

    #[test]
    fn node_serializes_camel_case_with_type_tag() {
        let resource = NodeResource {
            title: "MDN".into(),
            kind: ResourceKind::Article,
            url: None,
        };
        let json = serde_json::to_string(&resource).expect("json");
        assert_eq!(json, r#"{"title":"MDN","type":"article"}"#);
    }

    #[test]
    fn login_response_user() {
        let login: LoginResponse = serde_json::from_str(
            r#"{"access_token": "t", "user_id": 5, "user_email": "a@b.c", "user_name": "Ada"}"#,
        )
        .expect("login");
        assert_eq!(login.token_type, "bearer");
        let user = login.user();
        assert_eq!(user.id, UserId(5));
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn user_accepts_joined_at_aliases() {
        let user: User = serde_json::from_str(
            r#"{"id": 1, "name": "A", "email": "a@b.c", "joined_at": "2024-03-01T10:00:00"}"#,
        )
        .expect("user");
        assert_eq!(user.joined_at.as_deref(), Some("2024-03-01T10:00:00"));
    }
}
