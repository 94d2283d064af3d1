//! # Achievements
//!
//! Achievement catalogue types and the grouped board shown on the
//! achievements view.

use crate::types::null_as_default;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// An achievement definition from `GET /achievements/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub condition_type: String,
    #[serde(default)]
    pub condition_value: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_scheme: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// An achievement the user has unlocked, from `GET /achievements/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: u64,
    pub achievement_id: u64,
    pub unlocked_at: String,
    #[serde(default)]
    pub is_notified: bool,
    pub achievement: Achievement,
}

// =============================================================================
// COLOR SCHEME
// =============================================================================

static GRADIENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"from-[A-Za-z0-9_-]+ to-[A-Za-z0-9_-]+").ok());
static BORDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"border-[A-Za-z0-9_-]+").ok());
static BACKGROUND: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"bg-[A-Za-z0-9_-]+").ok());
static TEXT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"text-[A-Za-z0-9_-]+").ok());

fn first_match<'a>(pattern: &LazyLock<Option<Regex>>, haystack: &'a str) -> Option<&'a str> {
    let re = (**pattern).as_ref()?;
    re.find(haystack).map(|m| m.as_str())
}

/// Style classes extracted from an achievement's `color_scheme` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub gradient: String,
    pub border: String,
    pub icon_bg: String,
    pub icon_text: String,
}

impl ColorScheme {
    /// Pick the first class of each kind, falling back to the gray palette.
    #[must_use]
    pub fn parse(scheme: &str) -> Self {
        Self {
            gradient: first_match(&GRADIENT, scheme).map_or_else(
                || "bg-gradient-to-r from-gray-50 to-gray-100".to_string(),
                |pair| format!("bg-gradient-to-r {pair}"),
            ),
            border: first_match(&BORDER, scheme)
                .unwrap_or("border-gray-100")
                .to_string(),
            icon_bg: first_match(&BACKGROUND, scheme)
                .unwrap_or("bg-gray-100")
                .to_string(),
            icon_text: first_match(&TEXT, scheme)
                .unwrap_or("text-gray-600")
                .to_string(),
        }
    }
}

/// Heading for an achievement category.
#[must_use]
pub fn category_display_name(category: &str) -> &str {
    match category {
        "milestone" => "Milestone Progress",
        "roadmap" => "Roadmap Creation",
        "general" => "General",
        other => other,
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// One achievement with the user's unlock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementTile {
    pub achievement: Achievement,
    pub unlocked_at: Option<String>,
    pub colors: ColorScheme,
}

impl AchievementTile {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// Achievements grouped by category, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AchievementBoard {
    pub groups: Vec<(String, Vec<AchievementTile>)>,
}

impl AchievementBoard {
    #[must_use]
    pub fn build(all: &[Achievement], unlocked: &[UserAchievement]) -> Self {
        let mut groups: Vec<(String, Vec<AchievementTile>)> = Vec::new();
        for achievement in all {
            let tile = AchievementTile {
                unlocked_at: unlocked
                    .iter()
                    .find(|ua| ua.achievement_id == achievement.id)
                    .map(|ua| ua.unlocked_at.clone()),
                colors: ColorScheme::parse(&achievement.color_scheme),
                achievement: achievement.clone(),
            };
            match groups.iter_mut().find(|(cat, _)| *cat == achievement.category) {
                Some((_, tiles)) => tiles.push(tile),
                None => groups.push((achievement.category.clone(), vec![tile])),
            }
        }
        Self { groups }
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, tiles)| tiles.len()).sum()
    }

    pub fn unlocked_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|(_, tiles)| tiles)
            .filter(|t| t.is_unlocked())
            .count()
    }
}
