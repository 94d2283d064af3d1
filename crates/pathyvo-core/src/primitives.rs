//! # Primitives
//!
//! Fixed constants shared by the core and the client.
//!
//! These values mirror what the Pathyvo backend and product views assume.
//! They are compiled in and not configurable at runtime unless noted.

/// Default backend base URL. The client config may override it.
pub const DEFAULT_API_BASE_URL: &str = "https://pathyvo.app/api";

/// Number of entries shown in the activity feed.
pub const ACTIVITY_LOG_LIMIT: usize = 10;

/// Number of recently completed milestones requested from the backend.
///
/// Matches the backend's own default for `/roadmaps/analytics/recent-milestones`.
pub const RECENT_MILESTONES_LIMIT: usize = 20;

/// Number of fields listed in the analytics "top categories" panel.
pub const TOP_CATEGORIES_LIMIT: usize = 5;

/// Field label used when a roadmap has no field.
pub const UNCATEGORIZED_FIELD: &str = "Other";

/// A roadmap at this progress is considered finished.
pub const COMPLETE_PROGRESS: u8 = 100;

// =============================================================================
// PROGRESS BAND THRESHOLDS
// =============================================================================

/// Lower bound (inclusive) of the "building" band.
pub const BUILDING_THRESHOLD: u8 = 25;

/// Lower bound (inclusive) of the "advancing" band.
pub const ADVANCING_THRESHOLD: u8 = 50;

/// Lower bound (inclusive) of the "finishing" band.
pub const FINISHING_THRESHOLD: u8 = 75;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_thresholds_are_ordered() {
        assert!(BUILDING_THRESHOLD < ADVANCING_THRESHOLD);
        assert!(ADVANCING_THRESHOLD < FINISHING_THRESHOLD);
        assert!(FINISHING_THRESHOLD < COMPLETE_PROGRESS);
    }
}
