use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{PersistenceError, PersistenceResult};
use crate::config::AnalysisConfig;
use crate::dates::{format_date, parse_date};
use crate::metadata::PortfolioMetadata;
use crate::portfolio::Portfolio;
use crate::resource::{Allocation, Resource, ResourceKind};

#[derive(Serialize, Deserialize)]
struct PortfolioSnapshot {
    metadata: PortfolioMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<AnalysisConfig>,
    resources: Vec<Resource>,
    #[serde(default)]
    allocations: Vec<Allocation>,
}

impl PortfolioSnapshot {
    fn from_portfolio(portfolio: &Portfolio) -> Self {
        Self {
            metadata: portfolio.metadata().clone(),
            config: Some(*portfolio.config()),
            resources: portfolio.resources().to_vec(),
            allocations: portfolio.allocations().to_vec(),
        }
    }

    fn into_portfolio(self) -> PersistenceResult<Portfolio> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let portfolio =
            Portfolio::from_parts(self.metadata, config, self.resources, self.allocations)?;
        Ok(portfolio)
    }
}

pub fn save_portfolio_to_json<P: AsRef<Path>>(
    portfolio: &Portfolio,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = PortfolioSnapshot::from_portfolio(portfolio);
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_portfolio_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Portfolio> {
    let file = File::open(path)?;
    let snapshot: PortfolioSnapshot = serde_json::from_reader(file)?;
    snapshot.into_portfolio()
}

const METADATA_ROW: &str = "metadata";
const RESOURCE_ROW: &str = "resource";
const ALLOCATION_ROW: &str = "allocation";

/// One CSV row. `record_type` selects which columns are meaningful.
#[derive(Default, Serialize, Deserialize)]
struct PortfolioCsvRecord {
    record_type: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    daily_capacity: String,
    #[serde(default)]
    hourly_cost: String,
    #[serde(default)]
    skills: String,
    #[serde(default)]
    resource_id: String,
    #[serde(default)]
    task_id: String,
    #[serde(default)]
    allocated_hours: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    allocation_percent: String,
    #[serde(default)]
    metadata_json: String,
    #[serde(default)]
    config_json: String,
}

impl From<&Resource> for PortfolioCsvRecord {
    fn from(resource: &Resource) -> Self {
        PortfolioCsvRecord {
            record_type: RESOURCE_ROW.to_string(),
            id: resource.id.clone(),
            name: resource.name.clone(),
            kind: resource.kind.as_str().to_string(),
            daily_capacity: resource.daily_capacity.to_string(),
            hourly_cost: resource
                .hourly_cost
                .map(|cost| cost.to_string())
                .unwrap_or_default(),
            skills: resource
                .skills
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(";"),
            ..PortfolioCsvRecord::default()
        }
    }
}

impl From<&Allocation> for PortfolioCsvRecord {
    fn from(allocation: &Allocation) -> Self {
        PortfolioCsvRecord {
            record_type: ALLOCATION_ROW.to_string(),
            resource_id: allocation.resource_id.clone(),
            task_id: allocation.task_id.clone(),
            allocated_hours: allocation.allocated_hours.to_string(),
            start_date: format_date(allocation.start_date),
            end_date: format_date(allocation.end_date),
            allocation_percent: allocation.allocation_percent.to_string(),
            ..PortfolioCsvRecord::default()
        }
    }
}

impl PortfolioCsvRecord {
    fn metadata_row(portfolio: &Portfolio) -> PersistenceResult<Self> {
        Ok(PortfolioCsvRecord {
            record_type: METADATA_ROW.to_string(),
            metadata_json: serde_json::to_string(portfolio.metadata())?,
            config_json: serde_json::to_string(portfolio.config())?,
            ..PortfolioCsvRecord::default()
        })
    }

    fn into_resource(self) -> PersistenceResult<Resource> {
        let kind = ResourceKind::from_str(&self.kind).map_err(|_| {
            PersistenceError::InvalidData(format!(
                "resource '{}' has unknown kind '{}'",
                self.id, self.kind
            ))
        })?;
        let daily_capacity = parse_f64(&self.daily_capacity)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("resource '{}' is missing daily_capacity", self.id))
        })?;
        let mut resource = Resource::new(self.id, kind, daily_capacity);
        if !self.name.trim().is_empty() {
            resource.name = self.name;
        }
        resource.hourly_cost = parse_f64(&self.hourly_cost)?;
        resource.skills = self
            .skills
            .split(';')
            .map(str::trim)
            .filter(|skill| !skill.is_empty())
            .map(str::to_string)
            .collect();
        Ok(resource)
    }

    fn into_allocation(self) -> PersistenceResult<Allocation> {
        let missing = |field: &str| {
            PersistenceError::InvalidData(format!(
                "allocation of task '{}' is missing {field}",
                self.task_id
            ))
        };
        let allocated_hours =
            parse_f64(&self.allocated_hours)?.ok_or_else(|| missing("allocated_hours"))?;
        let start_date = parse_csv_date(&self.start_date)?.ok_or_else(|| missing("start_date"))?;
        let end_date = parse_csv_date(&self.end_date)?.ok_or_else(|| missing("end_date"))?;
        let allocation_percent =
            parse_f64(&self.allocation_percent)?.ok_or_else(|| missing("allocation_percent"))?;
        Ok(Allocation::new(
            self.resource_id,
            self.task_id,
            allocated_hours,
            start_date,
            end_date,
            allocation_percent,
        ))
    }
}

pub fn save_portfolio_to_csv<P: AsRef<Path>>(
    portfolio: &Portfolio,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(PortfolioCsvRecord::metadata_row(portfolio)?)?;
    for resource in portfolio.resources() {
        writer.serialize(PortfolioCsvRecord::from(resource))?;
    }
    for allocation in portfolio.allocations() {
        writer.serialize(PortfolioCsvRecord::from(allocation))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_portfolio_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Portfolio> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut metadata: Option<PortfolioMetadata> = None;
    let mut config: Option<AnalysisConfig> = None;
    let mut resources = Vec::new();
    let mut allocations = Vec::new();

    for record in reader.deserialize::<PortfolioCsvRecord>() {
        let record = record?;
        match record.record_type.trim() {
            METADATA_ROW => {
                if metadata.is_some() {
                    return Err(PersistenceError::InvalidData(
                        "CSV file contained multiple metadata rows".into(),
                    ));
                }
                metadata = Some(serde_json::from_str(&record.metadata_json).map_err(|err| {
                    PersistenceError::InvalidData(format!("invalid metadata json: {err}"))
                })?);
                if !record.config_json.trim().is_empty() {
                    config = Some(serde_json::from_str(&record.config_json).map_err(|err| {
                        PersistenceError::InvalidData(format!("invalid config json: {err}"))
                    })?);
                }
            }
            RESOURCE_ROW => resources.push(record.into_resource()?),
            ALLOCATION_ROW => allocations.push(record.into_allocation()?),
            other => {
                return Err(PersistenceError::InvalidData(format!(
                    "unknown record_type '{other}'"
                )));
            }
        }
    }

    let config = config.unwrap_or_default();
    config.validate()?;
    let portfolio = Portfolio::from_parts(
        metadata.unwrap_or_default(),
        config,
        resources,
        allocations,
    )?;
    Ok(portfolio)
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn parse_csv_date(input: &str) -> PersistenceResult<Option<chrono::NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_date(input)
        .map(Some)
        .ok_or_else(|| PersistenceError::InvalidData(format!("invalid date '{input}'")))
}
