use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::canonical_order;
use crate::dates::each_day;
use crate::error::AnalysisResult;
use crate::resource::{Allocation, Resource};
use crate::timeline::UtilizationTimeline;
use crate::validation;

/// Load on a single resource for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyUtilization {
    pub date: NaiveDate,
    pub hours: f64,
    /// Capped at 100 for display.
    pub percent: f64,
    /// Uncapped ratio used for overload decisions.
    pub raw_percent: f64,
    pub overloaded: bool,
}

/// Summed hours of every allocation covering `date`.
pub(crate) fn hours_on(allocations: &[&Allocation], date: NaiveDate) -> f64 {
    allocations
        .iter()
        .filter(|allocation| allocation.covers(date))
        .map(|allocation| allocation.allocated_hours)
        .sum()
}

pub(crate) fn day_utilization(
    resource: &Resource,
    allocations: &[&Allocation],
    date: NaiveDate,
) -> DailyUtilization {
    let hours = hours_on(allocations, date);
    let raw_percent = hours / resource.daily_capacity * 100.0;
    DailyUtilization {
        date,
        hours,
        percent: raw_percent.min(100.0),
        raw_percent,
        overloaded: raw_percent > 100.0,
    }
}

/// Allocations belonging to `resource`, validated and in canonical order.
fn owned_allocations<'a>(
    resource: &Resource,
    allocations: &'a [Allocation],
) -> AnalysisResult<Vec<&'a Allocation>> {
    validation::validate_resource(resource)?;
    let known = HashSet::from([resource.id.as_str()]);
    let mut owned = Vec::new();
    for allocation in allocations
        .iter()
        .filter(|allocation| allocation.resource_id == resource.id)
    {
        validation::validate_allocation(allocation, &known)?;
        owned.push(allocation);
    }
    owned.sort_by(|a, b| canonical_order(a, b));
    Ok(owned)
}

/// Utilization of `resource` on `date`. Allocations of other resources are ignored.
pub fn utilization(
    resource: &Resource,
    allocations: &[Allocation],
    date: NaiveDate,
) -> AnalysisResult<DailyUtilization> {
    let owned = owned_allocations(resource, allocations)?;
    Ok(day_utilization(resource, &owned, date))
}

/// Day-by-day utilization of `resource` across the inclusive range.
pub fn timeline(
    resource: &Resource,
    allocations: &[Allocation],
    start: NaiveDate,
    end: NaiveDate,
) -> AnalysisResult<UtilizationTimeline> {
    validation::validate_range(start, end, 0)?;
    let owned = owned_allocations(resource, allocations)?;
    let days = each_day(start, end)
        .map(|date| day_utilization(resource, &owned, date))
        .collect();
    Ok(UtilizationTimeline::new(
        resource.id.clone(),
        resource.daily_capacity,
        days,
    ))
}
