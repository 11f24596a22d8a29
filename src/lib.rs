pub mod calculations;
pub mod config;
pub mod dates;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod metadata;
pub mod persistence;
pub mod portfolio;
pub mod resource;
pub mod timeline;
pub mod validation;

pub use calculations::advisor::{Suggestion, SuggestionKind, suggest, suggest_with};
pub use calculations::conflicts::{
    Conflict, Severity, SeverityCounts, count_by_severity, detect_conflicts,
    detect_conflicts_with, sort_conflicts,
};
pub use calculations::metrics::{Metrics, ResourceMetrics, aggregate};
pub use calculations::utilization::{DailyUtilization, timeline, utilization};
pub use config::{AdvisorConfig, AnalysisConfig, ConfigError, SeverityThresholds};
pub use dates::{days_in_span, each_day};
pub use error::{AnalysisError, AnalysisResult};
pub use metadata::PortfolioMetadata;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteResourceStore;
pub use persistence::{
    PersistenceError, PortfolioStore, ResourceStore, analyze_store, load_portfolio_from_csv,
    load_portfolio_from_json, save_portfolio_to_csv, save_portfolio_to_json,
};
pub use portfolio::{AnalysisReport, Portfolio, analyze};
pub use resource::{Allocation, Resource, ResourceKind};
pub use timeline::UtilizationTimeline;
