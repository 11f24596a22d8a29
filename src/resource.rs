use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The category of a capacity-bearing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Person,
    Equipment,
    /// Budget pools use a currency-equivalent unit but the same arithmetic.
    Budget,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Person => "person",
            ResourceKind::Equipment => "equipment",
            ResourceKind::Budget => "budget",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "person" | "human" => Ok(ResourceKind::Person),
            "equipment" => Ok(ResourceKind::Equipment),
            "budget" => Ok(ResourceKind::Budget),
            _ => Err(()),
        }
    }
}

/// A person, equipment unit, or budget pool with a finite daily capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier for the resource.
    pub id: String,
    /// Display name. Informational only.
    #[serde(default)]
    pub name: String,
    pub kind: ResourceKind,
    /// Hours per day the resource can be committed. Must be positive.
    pub daily_capacity: f64,
    /// Cost per hour. `None` when the resource is not billable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_cost: Option<f64>,
    /// Informational only; the analysis never looks at skills.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skills: BTreeSet<String>,
}

impl Resource {
    pub fn new(id: impl Into<String>, kind: ResourceKind, daily_capacity: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            daily_capacity,
            hourly_cost: None,
            skills: BTreeSet::new(),
        }
    }

    pub fn person(id: impl Into<String>, daily_capacity: f64) -> Self {
        Self::new(id, ResourceKind::Person, daily_capacity)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_hourly_cost(mut self, hourly_cost: f64) -> Self {
        self.hourly_cost = Some(hourly_cost);
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.insert(skill.into());
        self
    }

    /// Label used in suggestion text; falls back to the id when no name is set.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// A commitment of a resource to a task for an inclusive date range at a flat daily rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub resource_id: String,
    /// Opaque reference to an external task.
    pub task_id: String,
    /// Hours per day committed for every day of the span.
    pub allocated_hours: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Ratio recorded when the allocation was created. Stored as supplied and never re-derived.
    pub allocation_percent: f64,
}

impl Allocation {
    pub fn new(
        resource_id: impl Into<String>,
        task_id: impl Into<String>,
        allocated_hours: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        allocation_percent: f64,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            task_id: task_id.into(),
            allocated_hours,
            start_date,
            end_date,
            allocation_percent,
        }
    }

    /// Builds an allocation whose `allocation_percent` is taken from the resource's capacity
    /// at creation time.
    pub fn with_derived_percent(
        resource: &Resource,
        task_id: impl Into<String>,
        allocated_hours: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let percent = if resource.daily_capacity > 0.0 {
            allocated_hours / resource.daily_capacity * 100.0
        } else {
            0.0
        };
        Self::new(
            resource.id.clone(),
            task_id,
            allocated_hours,
            start_date,
            end_date,
            percent,
        )
    }

    /// Inclusive on both ends.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn days_in_span(&self) -> i64 {
        crate::dates::days_in_span(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn covers_is_inclusive_on_both_ends() {
        let alloc = Allocation::new("r1", "t1", 4.0, d(2024, 1, 15), d(2024, 1, 20), 50.0);
        assert!(alloc.covers(d(2024, 1, 15)));
        assert!(alloc.covers(d(2024, 1, 20)));
        assert!(!alloc.covers(d(2024, 1, 14)));
        assert!(!alloc.covers(d(2024, 1, 21)));
        assert_eq!(alloc.days_in_span(), 6);
    }

    #[test]
    fn derived_percent_uses_capacity() {
        let resource = Resource::person("r1", 8.0);
        let alloc = Allocation::with_derived_percent(&resource, "t1", 6.0, d(2024, 1, 1), d(2024, 1, 1));
        assert!((alloc.allocation_percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Equipment".parse::<ResourceKind>(), Ok(ResourceKind::Equipment));
        assert_eq!("human".parse::<ResourceKind>(), Ok(ResourceKind::Person));
        assert!("vehicle".parse::<ResourceKind>().is_err());
    }
}
