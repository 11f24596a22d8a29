use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::calculations::advisor::{self, Suggestion};
use crate::calculations::conflicts::{self, Conflict, SeverityCounts, count_by_severity};
use crate::calculations::metrics::{self, Metrics};
use crate::calculations::utilization::{self, DailyUtilization};
use crate::calculations::ResourceIndex;
use crate::config::{AnalysisConfig, ConfigError};
use crate::error::{AnalysisError, AnalysisResult};
use crate::metadata::PortfolioMetadata;
use crate::resource::{Allocation, Resource};
use crate::timeline::UtilizationTimeline;
use crate::validation;

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub metrics: Metrics,
    pub conflicts: Vec<Conflict>,
    pub suggestions: Vec<Suggestion>,
    pub severity_counts: SeverityCounts,
}

impl AnalysisReport {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("window={}..{}", self.range_start, self.range_end));
        parts.push(format!(
            "resources={}/{}",
            self.metrics.active, self.metrics.total
        ));
        parts.push(format!("avg_util={:.1}%", self.metrics.avg_utilization));
        parts.push(format!("cost={:.2}", self.metrics.total_cost));
        parts.push(format!("conflicts={}", self.conflicts.len()));
        if self.severity_counts.high > 0 {
            parts.push(format!("high={}", self.severity_counts.high));
        }
        if self.severity_counts.medium > 0 {
            parts.push(format!("medium={}", self.severity_counts.medium));
        }
        if self.severity_counts.low > 0 {
            parts.push(format!("low={}", self.severity_counts.low));
        }
        if !self.suggestions.is_empty() {
            let kinds = self
                .suggestions
                .iter()
                .map(|s| s.kind.as_str())
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("suggestions={kinds}"));
        }
        parts.join(", ")
    }
}

/// Validates the snapshot once, then runs conflict detection, aggregation and the advisor.
#[instrument(skip_all, fields(resources = resources.len(), allocations = allocations.len(), start = %range_start, end = %range_end))]
pub fn analyze(
    resources: &[Resource],
    allocations: &[Allocation],
    range_start: NaiveDate,
    range_end: NaiveDate,
    config: &AnalysisConfig,
) -> AnalysisResult<AnalysisReport> {
    validation::validate_range(range_start, range_end, config.max_range_days)?;
    validation::validate_snapshot(resources, allocations)?;

    let index = ResourceIndex::build(resources, allocations);
    let conflicts = conflicts::scan(&index, range_start, range_end, &config.severity);
    let metrics = metrics::aggregate_index(&index);
    let suggestions = advisor::advise(&index, &conflicts, &config.advisor);
    let severity_counts = count_by_severity(&conflicts);

    tracing::debug!(
        conflicts = conflicts.len(),
        suggestions = suggestions.len(),
        "analysis complete"
    );
    if severity_counts.high > 0 {
        tracing::info!(
            high = severity_counts.high,
            "high-severity resource conflicts detected"
        );
    }

    Ok(AnalysisReport {
        range_start,
        range_end,
        metrics,
        conflicts,
        suggestions,
        severity_counts,
    })
}

/// An in-memory snapshot of resources and allocations with its own metadata and config.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    metadata: PortfolioMetadata,
    config: AnalysisConfig,
    resources: Vec<Resource>,
    allocations: Vec<Allocation>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_metadata(metadata: PortfolioMetadata) -> AnalysisResult<Self> {
        Self::from_parts(metadata, AnalysisConfig::default(), Vec::new(), Vec::new())
    }

    /// Builds a portfolio from loaded records; the whole snapshot is validated first.
    pub fn from_parts(
        metadata: PortfolioMetadata,
        config: AnalysisConfig,
        resources: Vec<Resource>,
        allocations: Vec<Allocation>,
    ) -> AnalysisResult<Self> {
        validation::validate_range(metadata.range_start, metadata.range_end, 0)?;
        validation::validate_snapshot(&resources, &allocations)?;
        Ok(Self {
            metadata,
            config,
            resources,
            allocations,
        })
    }

    pub fn metadata(&self) -> &PortfolioMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: PortfolioMetadata) -> AnalysisResult<()> {
        validation::validate_range(metadata.range_start, metadata.range_end, 0)?;
        self.metadata = metadata;
        Ok(())
    }

    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> AnalysisResult<()> {
        validation::validate_range(start, end, 0)?;
        self.metadata.range_start = start;
        self.metadata.range_end = end;
        Ok(())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn find_resource(&self, resource_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == resource_id)
    }

    /// Fails when a resource with the same id already exists.
    pub fn add_resource(&mut self, resource: Resource) -> AnalysisResult<()> {
        validation::validate_resource(&resource)?;
        if self.find_resource(&resource.id).is_some() {
            return Err(AnalysisError::InvalidResource {
                resource_id: resource.id,
                reason: "duplicate resource id".to_string(),
            });
        }
        self.resources.push(resource);
        Ok(())
    }

    /// Inserts or replaces by id. Returns `true` when the resource is new.
    pub fn upsert_resource(&mut self, resource: Resource) -> AnalysisResult<bool> {
        validation::validate_resource(&resource)?;
        match self.resources.iter_mut().find(|r| r.id == resource.id) {
            Some(existing) => {
                *existing = resource;
                Ok(false)
            }
            None => {
                self.resources.push(resource);
                Ok(true)
            }
        }
    }

    /// Removes the resource together with every allocation referencing it.
    pub fn remove_resource(&mut self, resource_id: &str) -> bool {
        let before = self.resources.len();
        self.resources.retain(|r| r.id != resource_id);
        if self.resources.len() == before {
            return false;
        }
        self.allocations.retain(|a| a.resource_id != resource_id);
        true
    }

    pub fn add_allocation(&mut self, allocation: Allocation) -> AnalysisResult<()> {
        let known: HashSet<&str> = self.resources.iter().map(|r| r.id.as_str()).collect();
        validation::validate_allocation(&allocation, &known)?;
        self.allocations.push(allocation);
        Ok(())
    }

    /// Removes every allocation of `task_id` to `resource_id`; returns how many went.
    pub fn remove_allocation(&mut self, resource_id: &str, task_id: &str) -> usize {
        let before = self.allocations.len();
        self.allocations
            .retain(|a| !(a.resource_id == resource_id && a.task_id == task_id));
        before - self.allocations.len()
    }

    pub fn utilization(
        &self,
        resource_id: &str,
        date: NaiveDate,
    ) -> AnalysisResult<Option<DailyUtilization>> {
        match self.find_resource(resource_id) {
            Some(resource) => utilization::utilization(resource, &self.allocations, date).map(Some),
            None => Ok(None),
        }
    }

    pub fn timeline(
        &self,
        resource_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AnalysisResult<Option<UtilizationTimeline>> {
        match self.find_resource(resource_id) {
            Some(resource) => {
                utilization::timeline(resource, &self.allocations, start, end).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Analysis over the metadata window.
    pub fn analyze(&self) -> AnalysisResult<AnalysisReport> {
        self.analyze_range(self.metadata.range_start, self.metadata.range_end)
    }

    pub fn analyze_range(&self, start: NaiveDate, end: NaiveDate) -> AnalysisResult<AnalysisReport> {
        analyze(&self.resources, &self.allocations, start, end, &self.config)
    }

    pub fn into_parts(self) -> (PortfolioMetadata, AnalysisConfig, Vec<Resource>, Vec<Allocation>) {
        (self.metadata, self.config, self.resources, self.allocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Portfolio {
        let metadata = PortfolioMetadata::with_range(d(2024, 1, 1), d(2024, 1, 31));
        let mut portfolio = Portfolio::new_with_metadata(metadata).unwrap();
        portfolio
            .add_resource(Resource::person("r1", 8.0).with_hourly_cost(50.0))
            .unwrap();
        portfolio
            .add_allocation(Allocation::new("r1", "t1", 6.0, d(2024, 1, 15), d(2024, 1, 20), 75.0))
            .unwrap();
        portfolio
            .add_allocation(Allocation::new("r1", "t2", 8.0, d(2024, 1, 18), d(2024, 1, 25), 100.0))
            .unwrap();
        portfolio
    }

    #[test]
    fn add_resource_rejects_duplicates() {
        let mut portfolio = sample();
        let err = portfolio
            .add_resource(Resource::person("r1", 4.0))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert!(!portfolio.upsert_resource(Resource::person("r1", 4.0)).unwrap());
        assert_eq!(portfolio.find_resource("r1").unwrap().daily_capacity, 4.0);
    }

    #[test]
    fn allocation_for_unknown_resource_is_rejected() {
        let mut portfolio = sample();
        let err = portfolio
            .add_allocation(Allocation::new("nobody", "t9", 1.0, d(2024, 1, 1), d(2024, 1, 1), 10.0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidAllocation { .. }));
        assert_eq!(portfolio.allocations().len(), 2);
    }

    #[test]
    fn removing_a_resource_cascades() {
        let mut portfolio = sample();
        assert!(portfolio.remove_resource("r1"));
        assert!(portfolio.allocations().is_empty());
        assert!(!portfolio.remove_resource("r1"));
    }

    #[test]
    fn analyze_uses_metadata_window() {
        let report = sample().analyze().unwrap();
        assert_eq!(report.range_start, d(2024, 1, 1));
        assert_eq!(report.conflicts.len(), 3);
        assert_eq!(report.severity_counts.high, 3);
        let summary = report.to_cli_summary();
        assert!(summary.contains("conflicts=3"));
        assert!(summary.contains("high=3"));
    }

    #[test]
    fn unknown_resource_has_no_utilization() {
        let portfolio = sample();
        assert!(portfolio.utilization("ghost", d(2024, 1, 19)).unwrap().is_none());
        let day = portfolio.utilization("r1", d(2024, 1, 19)).unwrap().unwrap();
        assert_eq!(day.hours, 14.0);
    }
}
