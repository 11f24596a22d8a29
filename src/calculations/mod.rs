pub mod advisor;
pub mod conflicts;
pub mod metrics;
pub mod utilization;

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::resource::{Allocation, Resource};

/// Resources and their allocations grouped once, by resource position, before any per-day scan.
///
/// Allocations inside each group are kept in a canonical order so that summed hours do not
/// depend on the order the caller supplied them in.
pub struct ResourceIndex<'a> {
    resources: &'a [Resource],
    positions: HashMap<&'a str, usize>,
    allocations: Vec<Vec<&'a Allocation>>,
}

impl<'a> ResourceIndex<'a> {
    /// Allocations referencing unknown resources are skipped; validate the snapshot first.
    pub fn build(resources: &'a [Resource], allocations: &'a [Allocation]) -> Self {
        let positions: HashMap<&'a str, usize> = resources
            .iter()
            .enumerate()
            .map(|(idx, resource)| (resource.id.as_str(), idx))
            .collect();

        let mut grouped: Vec<Vec<&'a Allocation>> = vec![Vec::new(); resources.len()];
        for allocation in allocations {
            if let Some(&idx) = positions.get(allocation.resource_id.as_str()) {
                grouped[idx].push(allocation);
            }
        }
        for group in &mut grouped {
            group.sort_by(|a, b| canonical_order(a, b));
        }

        Self {
            resources,
            positions,
            allocations: grouped,
        }
    }

    pub fn resources(&self) -> &'a [Resource] {
        self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn position(&self, resource_id: &str) -> Option<usize> {
        self.positions.get(resource_id).copied()
    }

    pub fn allocations_at(&self, position: usize) -> &[&'a Allocation] {
        self.allocations
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn allocations_for(&self, resource_id: &str) -> &[&'a Allocation] {
        match self.position(resource_id) {
            Some(position) => self.allocations_at(position),
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a Resource, &[&'a Allocation])> + '_ {
        self.resources
            .iter()
            .zip(self.allocations.iter().map(Vec::as_slice))
    }
}

pub(crate) fn canonical_order(a: &Allocation, b: &Allocation) -> Ordering {
    a.start_date
        .cmp(&b.start_date)
        .then_with(|| a.end_date.cmp(&b.end_date))
        .then_with(|| a.task_id.cmp(&b.task_id))
        .then_with(|| a.allocated_hours.total_cmp(&b.allocated_hours))
        .then_with(|| a.allocation_percent.total_cmp(&b.allocation_percent))
}

/// Arithmetic mean of the stored `allocation_percent` values; zero without allocations.
pub(crate) fn mean_allocation_percent(allocations: &[&Allocation]) -> f64 {
    if allocations.is_empty() {
        return 0.0;
    }
    let total: f64 = allocations.iter().map(|a| a.allocation_percent).sum();
    total / allocations.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn groups_by_resource_in_canonical_order() {
        let resources = vec![Resource::person("a", 8.0), Resource::person("b", 8.0)];
        let allocations = vec![
            Allocation::new("b", "t3", 2.0, d(2024, 1, 5), d(2024, 1, 6), 25.0),
            Allocation::new("a", "t2", 2.0, d(2024, 1, 3), d(2024, 1, 4), 25.0),
            Allocation::new("a", "t1", 2.0, d(2024, 1, 1), d(2024, 1, 4), 25.0),
            Allocation::new("ghost", "t9", 2.0, d(2024, 1, 1), d(2024, 1, 4), 25.0),
        ];
        let index = ResourceIndex::build(&resources, &allocations);
        let a_tasks: Vec<_> = index
            .allocations_for("a")
            .iter()
            .map(|a| a.task_id.as_str())
            .collect();
        assert_eq!(a_tasks, vec!["t1", "t2"]);
        assert_eq!(index.allocations_for("b").len(), 1);
        assert!(index.allocations_for("ghost").is_empty());
    }

    #[test]
    fn mean_of_stored_percent() {
        let a1 = Allocation::new("a", "t1", 1.0, d(2024, 1, 1), d(2024, 1, 1), 40.0);
        let a2 = Allocation::new("a", "t2", 1.0, d(2024, 1, 1), d(2024, 1, 1), 100.0);
        assert_eq!(mean_allocation_percent(&[&a1, &a2]), 70.0);
        assert_eq!(mean_allocation_percent(&[]), 0.0);
    }
}
