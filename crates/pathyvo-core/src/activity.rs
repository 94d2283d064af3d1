//! # Activity Log
//!
//! Merges recently completed milestones and unlocked achievements into a
//! single feed, newest first.

use crate::achievement::UserAchievement;
use crate::types::{MilestoneId, RoadmapId, null_as_default};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (converted to UTC), naive ISO 8601 date-times with
/// optional fractional seconds, and bare dates (midnight).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Human-readable age of `timestamp` relative to `now`.
///
/// Returns the raw string when it cannot be parsed.
#[must_use]
pub fn describe_age(timestamp: &str, now: NaiveDateTime) -> String {
    let Some(at) = parse_timestamp(timestamp) else {
        return timestamp.to_string();
    };
    let elapsed = now - at;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{days} days ago")
    } else if at.year() != now.year() {
        at.format("%b %-d, %Y").to_string()
    } else {
        at.format("%b %-d").to_string()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Roadmap reference attached to a recent milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapRef {
    pub id: RoadmapId,
    pub title: String,
}

/// A completed milestone from `GET /roadmaps/analytics/recent-milestones`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentMilestone {
    pub id: MilestoneId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub roadmap: Option<RoadmapRef>,
}

// =============================================================================
// FEED
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Milestone,
    Achievement,
}

/// One line of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// `milestone-<id>` or `achievement-<id>`.
    pub id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_icon: Option<String>,
}

impl From<&UserAchievement> for ActivityEntry {
    fn from(unlocked: &UserAchievement) -> Self {
        ActivityEntry {
            id: format!("achievement-{}", unlocked.id),
            kind: ActivityKind::Achievement,
            title: unlocked.achievement.title.clone(),
            description: unlocked.achievement.description.clone(),
            timestamp: unlocked.unlocked_at.clone(),
            roadmap_title: None,
            achievement_icon: Some(unlocked.achievement.icon.clone()),
        }
    }
}

/// Build the feed: newest first, at most `limit` entries.
///
/// Milestones without `completed_at` are skipped. Entries whose timestamp
/// cannot be parsed sort after all others, keeping their relative order.
#[must_use]
pub fn build_activity_log(
    milestones: &[RecentMilestone],
    achievements: &[UserAchievement],
    limit: usize,
) -> Vec<ActivityEntry> {
    let milestone_entries = milestones.iter().filter_map(|m| {
        let completed_at = m.completed_at.as_ref()?;
        Some(ActivityEntry {
            id: format!("milestone-{}", m.id),
            kind: ActivityKind::Milestone,
            title: m.title.clone(),
            description: m.description.clone(),
            timestamp: completed_at.clone(),
            roadmap_title: m.roadmap.as_ref().map(|r| r.title.clone()),
            achievement_icon: None,
        })
    });

    let mut entries: Vec<(Option<NaiveDateTime>, ActivityEntry)> = milestone_entries
        .chain(achievements.iter().map(ActivityEntry::from))
        .map(|entry| (parse_timestamp(&entry.timestamp), entry))
        .collect();

    entries.sort_by(|(a, _), (b, _)| b.cmp(a));
    entries.truncate(limit);
    entries.into_iter().map(|(_, entry)| entry).collect()
}
