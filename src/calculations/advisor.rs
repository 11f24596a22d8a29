use std::fmt;

use serde::{Deserialize, Serialize};

use super::conflicts::{Conflict, Severity};
use super::{ResourceIndex, mean_allocation_percent};
use crate::config::{AdvisorConfig, AnalysisConfig};
use crate::error::AnalysisResult;
use crate::resource::{Allocation, Resource};
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Level,
    Reallocate,
    Hire,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Level => "level",
            SuggestionKind::Reallocate => "reallocate",
            SuggestionKind::Hire => "hire",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived recommendation.
///
/// `estimated_impact` is a heuristic score with no defined unit: positive reads as benefit,
/// negative as cost. Do not present it as a financial figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub description: String,
    pub impact_description: String,
    pub affected_resource_ids: Vec<String>,
    pub estimated_impact: f64,
}

pub fn suggest(
    resources: &[Resource],
    allocations: &[Allocation],
    conflicts: &[Conflict],
) -> AnalysisResult<Vec<Suggestion>> {
    suggest_with(resources, allocations, conflicts, &AnalysisConfig::default())
}

pub fn suggest_with(
    resources: &[Resource],
    allocations: &[Allocation],
    conflicts: &[Conflict],
    config: &AnalysisConfig,
) -> AnalysisResult<Vec<Suggestion>> {
    validation::validate_snapshot(resources, allocations)?;
    let index = ResourceIndex::build(resources, allocations);
    Ok(advise(&index, conflicts, &config.advisor))
}

/// Runs the leveling, reallocation, and hiring passes. A resource may appear in more than one.
pub(crate) fn advise(
    index: &ResourceIndex<'_>,
    conflicts: &[Conflict],
    config: &AdvisorConfig,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for (resource, allocations) in index.iter() {
        let mean = mean_allocation_percent(allocations);
        if mean > config.leveling_threshold {
            suggestions.push(leveling(resource, mean));
        }
    }

    for (resource, allocations) in index.iter() {
        let mean = mean_allocation_percent(allocations);
        if mean > 0.0 && mean < config.reallocation_threshold {
            suggestions.push(reallocation(resource, mean));
        }
    }

    let high = conflicts
        .iter()
        .filter(|conflict| conflict.severity == Severity::High)
        .count();
    if high > config.hire_high_conflict_threshold {
        suggestions.push(hiring(high, config.hire_cost));
    }

    suggestions
}

fn leveling(resource: &Resource, mean: f64) -> Suggestion {
    Suggestion {
        kind: SuggestionKind::Level,
        description: format!(
            "Level the workload of {}: average allocation is {:.1}% of capacity",
            resource.display_name(),
            mean
        ),
        impact_description: "Reduces burnout risk and the chance of schedule slips".to_string(),
        affected_resource_ids: vec![resource.id.clone()],
        estimated_impact: mean * 100.0,
    }
}

fn reallocation(resource: &Resource, mean: f64) -> Suggestion {
    Suggestion {
        kind: SuggestionKind::Reallocate,
        description: format!(
            "Reallocate spare capacity of {}: average allocation is only {:.1}%",
            resource.display_name(),
            mean
        ),
        impact_description: "Puts idle capacity to work on overloaded tasks".to_string(),
        affected_resource_ids: vec![resource.id.clone()],
        estimated_impact: (100.0 - mean) * 50.0,
    }
}

fn hiring(high_conflicts: usize, hire_cost: f64) -> Suggestion {
    Suggestion {
        kind: SuggestionKind::Hire,
        description: format!(
            "Consider additional hiring: {high_conflicts} high-severity conflicts across the portfolio"
        ),
        impact_description: "Adds capacity where overcommitment is persistent".to_string(),
        affected_resource_ids: Vec::new(),
        estimated_impact: -hire_cost,
    }
}
