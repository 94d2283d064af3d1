//! # Progress Summaries
//!
//! Dashboard and analytics figures computed from the user's roadmap list.
//!
//! Per-roadmap counters (`progress`, `total_milestones`,
//! `completed_milestones`) come from the backend and are summed as-is; the
//! milestone lists are not re-counted. All percentages are integers rounded
//! half-up.

use crate::activity::parse_timestamp;
use crate::primitives::{
    ADVANCING_THRESHOLD, BUILDING_THRESHOLD, COMPLETE_PROGRESS, FINISHING_THRESHOLD,
    TOP_CATEGORIES_LIMIT, UNCATEGORIZED_FIELD,
};
use crate::types::{Roadmap, User};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// `round(numerator / denominator)` with halves rounded up. Returns 0 for a
/// zero denominator.
fn div_round_half_up(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    numerator
        .saturating_mul(2)
        .saturating_add(denominator)
        / denominator.saturating_mul(2)
}

// =============================================================================
// PROGRESS BAND
// =============================================================================

/// Coarse progress bucket used to color progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBand {
    /// Below 25%.
    Starting,
    /// 25% to 49%.
    Building,
    /// 50% to 74%.
    Advancing,
    /// 75% and above.
    Finishing,
}

impl ProgressBand {
    #[must_use]
    pub fn from_progress(progress: u8) -> Self {
        if progress >= FINISHING_THRESHOLD {
            ProgressBand::Finishing
        } else if progress >= ADVANCING_THRESHOLD {
            ProgressBand::Advancing
        } else if progress >= BUILDING_THRESHOLD {
            ProgressBand::Building
        } else {
            ProgressBand::Starting
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ProgressBand::Starting => "starting",
            ProgressBand::Building => "building",
            ProgressBand::Advancing => "advancing",
            ProgressBand::Finishing => "finishing",
        }
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Headline numbers on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_roadmaps: usize,
    pub total_milestones: u64,
    pub completed_milestones: u64,
    pub average_progress: u8,
}

impl DashboardStats {
    #[must_use]
    pub fn from_roadmaps(roadmaps: &[Roadmap]) -> Self {
        Self {
            active_roadmaps: roadmaps.len(),
            total_milestones: roadmaps.iter().map(|r| u64::from(r.total_milestones)).sum(),
            completed_milestones: roadmaps
                .iter()
                .map(|r| u64::from(r.completed_milestones))
                .sum(),
            average_progress: average_progress(roadmaps),
        }
    }
}

fn average_progress(roadmaps: &[Roadmap]) -> u8 {
    let sum: u64 = roadmaps.iter().map(|r| u64::from(r.progress)).sum();
    div_round_half_up(sum, roadmaps.len() as u64).min(u64::from(u8::MAX)) as u8
}

// =============================================================================
// ANALYTICS
// =============================================================================

/// Number of roadmaps in one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub field: String,
    pub count: usize,
}

/// Completed milestones in one calendar week, as returned by
/// `GET /roadmaps/analytics/milestones-by-date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyCount {
    /// Week label, e.g. `"Week 7, 2025"`.
    pub date: String,
    pub milestones: u32,
}

impl WeeklyCount {
    /// Bar length for a chart of `width` columns scaled to `max`.
    #[must_use]
    pub fn bar_len(&self, max: u32, width: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (u64::from(self.milestones).saturating_mul(width as u64) / u64::from(max)) as usize
    }
}

/// Figures on the analytics page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_roadmaps: usize,
    pub total_milestones: u64,
    pub completed_milestones: u64,
    pub completed_roadmaps: usize,
    pub average_progress: u8,
    pub completion_rate: u8,
    pub top_categories: Vec<CategoryCount>,
    pub days_active: i64,
}

impl AnalyticsSummary {
    /// Compute the summary as of `now`.
    ///
    /// `user.joined_at` feeds `days_active`; a missing or unparseable join
    /// date counts as joining today. `days_active` is at least 1.
    #[must_use]
    pub fn compute(roadmaps: &[Roadmap], user: Option<&User>, now: NaiveDateTime) -> Self {
        let dashboard = DashboardStats::from_roadmaps(roadmaps);
        let completed_roadmaps = roadmaps
            .iter()
            .filter(|r| r.progress == COMPLETE_PROGRESS)
            .count();
        let completion_rate = div_round_half_up(
            dashboard.completed_milestones.saturating_mul(100),
            dashboard.total_milestones,
        )
        .min(100) as u8;

        let joined = user
            .and_then(|u| u.joined_at.as_deref())
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let days_active = (now - joined).num_days().max(1);

        Self {
            total_roadmaps: roadmaps.len(),
            total_milestones: dashboard.total_milestones,
            completed_milestones: dashboard.completed_milestones,
            completed_roadmaps,
            average_progress: dashboard.average_progress,
            completion_rate,
            top_categories: top_categories(roadmaps, TOP_CATEGORIES_LIMIT),
            days_active,
        }
    }
}

/// Fields ranked by roadmap count, most first. Ties keep first-seen order.
#[must_use]
pub fn top_categories(roadmaps: &[Roadmap], limit: usize) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for roadmap in roadmaps {
        let field = roadmap.field_label().unwrap_or(UNCATEGORIZED_FIELD);
        match counts.iter_mut().find(|c| c.field == field) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                field: field.to_string(),
                count: 1,
            }),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

// =============================================================================
// TESTS
// =============================================================================
