use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::ResourceIndex;
use crate::config::{AnalysisConfig, SeverityThresholds};
use crate::dates::each_day;
use crate::error::AnalysisResult;
use crate::resource::{Allocation, Resource};
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A day on which a resource's allocated hours exceed its capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub resource_id: String,
    pub date: NaiveDate,
    pub over_hours: f64,
    /// Every task with an allocation covering the date, not only the ones pushing it over.
    pub involved_task_ids: Vec<String>,
    pub severity: Severity,
    pub allocated_hours: f64,
    pub capacity: f64,
}

/// Conflicts across `[range_start, range_end]` using the default severity thresholds.
pub fn detect_conflicts(
    resources: &[Resource],
    allocations: &[Allocation],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> AnalysisResult<Vec<Conflict>> {
    detect_conflicts_with(
        resources,
        allocations,
        range_start,
        range_end,
        &AnalysisConfig::default(),
    )
}

pub fn detect_conflicts_with(
    resources: &[Resource],
    allocations: &[Allocation],
    range_start: NaiveDate,
    range_end: NaiveDate,
    config: &AnalysisConfig,
) -> AnalysisResult<Vec<Conflict>> {
    validation::validate_range(range_start, range_end, config.max_range_days)?;
    validation::validate_snapshot(resources, allocations)?;
    let index = ResourceIndex::build(resources, allocations);
    Ok(scan(&index, range_start, range_end, &config.severity))
}

/// Conflicts grouped by resource (index order), then by date. Inputs must already be validated.
pub(crate) fn scan(
    index: &ResourceIndex<'_>,
    range_start: NaiveDate,
    range_end: NaiveDate,
    thresholds: &SeverityThresholds,
) -> Vec<Conflict> {
    let per_resource: Vec<Vec<Conflict>> = (0..index.len())
        .into_par_iter()
        .map(|position| {
            let resource = &index.resources()[position];
            scan_resource(
                resource,
                index.allocations_at(position),
                range_start,
                range_end,
                thresholds,
            )
        })
        .collect();

    per_resource.into_iter().flatten().collect()
}

fn scan_resource(
    resource: &Resource,
    allocations: &[&Allocation],
    range_start: NaiveDate,
    range_end: NaiveDate,
    thresholds: &SeverityThresholds,
) -> Vec<Conflict> {
    if allocations.is_empty() {
        return Vec::new();
    }

    // Only the part of the range that any allocation touches can overflow.
    let first = allocations
        .iter()
        .map(|a| a.start_date)
        .min()
        .map_or(range_start, |d| d.max(range_start));
    let last = allocations
        .iter()
        .map(|a| a.end_date)
        .max()
        .map_or(range_end, |d| d.min(range_end));

    let mut conflicts = Vec::new();
    for date in each_day(first, last) {
        let covering: Vec<&Allocation> = allocations
            .iter()
            .copied()
            .filter(|allocation| allocation.covers(date))
            .collect();
        let hours: f64 = covering.iter().map(|a| a.allocated_hours).sum();
        if hours <= resource.daily_capacity {
            continue;
        }
        let over_hours = hours - resource.daily_capacity;
        let mut involved_task_ids: Vec<String> =
            covering.iter().map(|a| a.task_id.clone()).collect();
        involved_task_ids.sort();
        involved_task_ids.dedup();
        conflicts.push(Conflict {
            resource_id: resource.id.clone(),
            date,
            over_hours,
            involved_task_ids,
            severity: thresholds.classify(over_hours),
            allocated_hours: hours,
            capacity: resource.daily_capacity,
        });
    }
    conflicts
}

/// Canonical order: severity descending, then date, then resource id.
pub fn sort_conflicts(conflicts: &mut [Conflict]) {
    conflicts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.resource_id.cmp(&b.resource_id))
            .then_with(|| b.over_hours.partial_cmp(&a.over_hours).unwrap_or(Ordering::Equal))
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

pub fn count_by_severity(conflicts: &[Conflict]) -> SeverityCounts {
    conflicts
        .iter()
        .fold(SeverityCounts::default(), |mut counts, conflict| {
            match conflict.severity {
                Severity::Low => counts.low += 1,
                Severity::Medium => counts.medium += 1,
                Severity::High => counts.high += 1,
            }
            counts
        })
}
