use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive data for a portfolio plus the default window analysis runs over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetadata {
    pub name: String,
    pub description: String,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
}

impl PortfolioMetadata {
    pub const DEFAULT_WINDOW_DAYS: i64 = 30;

    pub fn with_range(range_start: NaiveDate, range_end: NaiveDate) -> Self {
        Self {
            range_start,
            range_end,
            ..Self::default()
        }
    }
}

impl Default for PortfolioMetadata {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            name: "New Portfolio".to_string(),
            description: "No description".to_string(),
            range_start: today,
            range_end: today + Duration::days(Self::DEFAULT_WINDOW_DAYS - 1),
        }
    }
}
