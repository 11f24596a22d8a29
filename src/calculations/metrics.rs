use serde::{Deserialize, Serialize};

use super::{ResourceIndex, mean_allocation_percent};
use crate::error::AnalysisResult;
use crate::resource::{Allocation, Resource};
use crate::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub resource_id: String,
    pub allocation_count: usize,
    /// Mean of the stored `allocation_percent` values; zero without allocations.
    pub mean_utilization: f64,
    pub cost: f64,
}

/// Portfolio-level figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total: usize,
    pub active: usize,
    pub avg_utilization: f64,
    pub total_cost: f64,
    #[serde(default)]
    pub per_resource: Vec<ResourceMetrics>,
}

pub fn aggregate(resources: &[Resource], allocations: &[Allocation]) -> AnalysisResult<Metrics> {
    validation::validate_snapshot(resources, allocations)?;
    let index = ResourceIndex::build(resources, allocations);
    Ok(aggregate_index(&index))
}

pub(crate) fn aggregate_index(index: &ResourceIndex<'_>) -> Metrics {
    let per_resource: Vec<ResourceMetrics> = index
        .iter()
        .map(|(resource, allocations)| ResourceMetrics {
            resource_id: resource.id.clone(),
            allocation_count: allocations.len(),
            mean_utilization: mean_allocation_percent(allocations),
            cost: labor_cost(resource, allocations),
        })
        .collect();

    let total = per_resource.len();
    let active = per_resource
        .iter()
        .filter(|metrics| metrics.allocation_count > 0)
        .count();
    // Idle resources stay in the denominator.
    let avg_utilization = if total == 0 {
        0.0
    } else {
        per_resource
            .iter()
            .map(|metrics| metrics.mean_utilization)
            .sum::<f64>()
            / total as f64
    };
    let total_cost = per_resource.iter().map(|metrics| metrics.cost).sum();

    Metrics {
        total,
        active,
        avg_utilization,
        total_cost,
        per_resource,
    }
}

fn labor_cost(resource: &Resource, allocations: &[&Allocation]) -> f64 {
    let Some(rate) = resource.hourly_cost else {
        return 0.0;
    };
    allocations
        .iter()
        .map(|allocation| allocation.allocated_hours * allocation.days_in_span() as f64 * rate)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_portfolio_is_all_zero() {
        let metrics = aggregate(&[], &[]).unwrap();
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.active, 0);
        assert_eq!(metrics.avg_utilization, 0.0);
        assert_eq!(metrics.total_cost, 0.0);
    }

    #[test]
    fn unbillable_resource_costs_nothing() {
        let resources = vec![Resource::person("r1", 8.0)];
        let allocations = vec![Allocation::new("r1", "t1", 8.0, d(2024, 1, 1), d(2024, 1, 5), 100.0)];
        let metrics = aggregate(&resources, &allocations).unwrap();
        assert_eq!(metrics.total_cost, 0.0);
        assert_eq!(metrics.per_resource[0].allocation_count, 1);
    }
}
