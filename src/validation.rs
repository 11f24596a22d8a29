use std::collections::HashSet;

use chrono::NaiveDate;

use crate::dates::days_in_span;
use crate::error::{AnalysisError, AnalysisResult};
use crate::resource::{Allocation, Resource};

pub fn validate_resource(resource: &Resource) -> AnalysisResult<()> {
    if resource.id.trim().is_empty() {
        return Err(AnalysisError::resource(
            &resource.id,
            "resource requires a non-empty id",
        ));
    }
    if !resource.daily_capacity.is_finite() || resource.daily_capacity <= 0.0 {
        return Err(AnalysisError::resource(
            &resource.id,
            format!(
                "daily_capacity must be a positive number (got {})",
                resource.daily_capacity
            ),
        ));
    }
    if let Some(cost) = resource.hourly_cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(AnalysisError::resource(
                &resource.id,
                format!("hourly_cost must be non-negative (got {cost})"),
            ));
        }
    }
    Ok(())
}

/// `known_resources` holds the ids of every resource in the batch.
pub fn validate_allocation(
    allocation: &Allocation,
    known_resources: &HashSet<&str>,
) -> AnalysisResult<()> {
    let reject = |reason: String| {
        Err(AnalysisError::allocation(
            &allocation.task_id,
            &allocation.resource_id,
            reason,
        ))
    };

    if allocation.task_id.trim().is_empty() {
        return reject("allocation requires a non-empty task_id".to_string());
    }
    if !known_resources.contains(allocation.resource_id.as_str()) {
        return reject(format!("unknown resource_id '{}'", allocation.resource_id));
    }
    if allocation.end_date < allocation.start_date {
        return reject(format!(
            "end_date {} is before start_date {}",
            allocation.end_date, allocation.start_date
        ));
    }
    if !allocation.allocated_hours.is_finite() || allocation.allocated_hours <= 0.0 {
        return reject(format!(
            "allocated_hours must be a positive number (got {})",
            allocation.allocated_hours
        ));
    }
    if !allocation.allocation_percent.is_finite() {
        return reject(format!(
            "allocation_percent must be finite (got {})",
            allocation.allocation_percent
        ));
    }
    Ok(())
}

/// Validates a whole snapshot. The first offending record rejects the entire batch.
pub fn validate_snapshot(resources: &[Resource], allocations: &[Allocation]) -> AnalysisResult<()> {
    let mut seen_ids = HashSet::with_capacity(resources.len());
    for resource in resources {
        validate_resource(resource)?;
        if !seen_ids.insert(resource.id.as_str()) {
            return Err(AnalysisError::resource(
                &resource.id,
                "duplicate resource id",
            ));
        }
    }
    for allocation in allocations {
        validate_allocation(allocation, &seen_ids)?;
    }
    Ok(())
}

pub fn validate_range(start: NaiveDate, end: NaiveDate, max_days: i64) -> AnalysisResult<()> {
    if end < start {
        return Err(AnalysisError::EmptyRange { start, end });
    }
    let days = days_in_span(start, end);
    if max_days > 0 && days > max_days {
        return Err(AnalysisError::RangeTooLarge {
            days,
            max: max_days,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let resource = Resource::new("r1", ResourceKind::Equipment, 0.0);
        let err = validate_resource(&resource).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResource { .. }));
        assert!(err.to_string().contains("daily_capacity"));
    }

    #[test]
    fn duplicate_resource_ids_reject_the_batch() {
        let resources = vec![Resource::person("r1", 8.0), Resource::person("r1", 6.0)];
        let err = validate_snapshot(&resources, &[]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn allocation_rules() {
        let resources = vec![Resource::person("r1", 8.0)];
        let ok = Allocation::new("r1", "t1", 4.0, d(2024, 1, 1), d(2024, 1, 2), 50.0);
        assert!(validate_snapshot(&resources, &[ok.clone()]).is_ok());

        let mut backwards = ok.clone();
        backwards.end_date = d(2023, 12, 31);
        let err = validate_snapshot(&resources, &[backwards]).unwrap_err();
        assert!(err.to_string().contains("before start_date"));

        let mut zero_hours = ok.clone();
        zero_hours.allocated_hours = 0.0;
        assert!(validate_snapshot(&resources, &[zero_hours]).is_err());

        let mut orphan = ok;
        orphan.resource_id = "ghost".into();
        let err = validate_snapshot(&resources, &[orphan]).unwrap_err();
        assert!(err.to_string().contains("unknown resource_id 'ghost'"));
    }

    #[test]
    fn range_checks() {
        assert!(validate_range(d(2024, 1, 1), d(2024, 1, 1), 10).is_ok());
        assert_eq!(
            validate_range(d(2024, 1, 2), d(2024, 1, 1), 10),
            Err(AnalysisError::EmptyRange {
                start: d(2024, 1, 2),
                end: d(2024, 1, 1)
            })
        );
        assert!(matches!(
            validate_range(d(2024, 1, 1), d(2024, 1, 11), 10),
            Err(AnalysisError::RangeTooLarge { days: 11, max: 10 })
        ));
    }
}
