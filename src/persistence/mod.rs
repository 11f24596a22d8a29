use std::io;

use chrono::NaiveDate;

use crate::config::{AnalysisConfig, ConfigError};
use crate::error::AnalysisError;
use crate::portfolio::{self, AnalysisReport, Portfolio};
use crate::resource::{Allocation, Resource};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Validation(#[from] AnalysisError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Read-only source of the records the analysis consumes.
pub trait ResourceStore {
    fn list_resources(&self) -> PersistenceResult<Vec<Resource>>;
    fn list_allocations(&self) -> PersistenceResult<Vec<Allocation>>;
}

/// A store that can also hold a whole portfolio.
pub trait PortfolioStore: ResourceStore {
    fn save_portfolio(&self, portfolio: &Portfolio) -> PersistenceResult<()>;
    fn load_portfolio(&self) -> PersistenceResult<Option<Portfolio>>;
}

impl ResourceStore for Portfolio {
    fn list_resources(&self) -> PersistenceResult<Vec<Resource>> {
        Ok(self.resources().to_vec())
    }

    fn list_allocations(&self) -> PersistenceResult<Vec<Allocation>> {
        Ok(self.allocations().to_vec())
    }
}

/// Pulls a fresh snapshot from `store` and analyzes it.
pub fn analyze_store<S: ResourceStore + ?Sized>(
    store: &S,
    range_start: NaiveDate,
    range_end: NaiveDate,
    config: &AnalysisConfig,
) -> PersistenceResult<AnalysisReport> {
    let resources = store.list_resources()?;
    let allocations = store.list_allocations()?;
    let report = portfolio::analyze(&resources, &allocations, range_start, range_end, config)?;
    Ok(report)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_portfolio_from_csv, load_portfolio_from_json, save_portfolio_to_csv,
    save_portfolio_to_json,
};
