use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use super::{PersistenceError, PersistenceResult, PortfolioStore, ResourceStore};
use crate::config::AnalysisConfig;
use crate::metadata::PortfolioMetadata;
use crate::portfolio::Portfolio;
use crate::resource::{Allocation, Resource};

pub struct SqliteResourceStore {
    connection: Mutex<Connection>,
}

impl SqliteResourceStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS portfolio_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL,
                config_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS resources (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                resource_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS allocations (
                position INTEGER PRIMARY KEY,
                resource_id TEXT NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
                allocation_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection mutex poisoned".into()))
    }

    fn save_metadata(
        tx: &rusqlite::Transaction,
        metadata: &PortfolioMetadata,
        config: &AnalysisConfig,
    ) -> PersistenceResult<()> {
        let metadata_json = serde_json::to_string(metadata)?;
        let config_json = serde_json::to_string(config)?;
        tx.execute("DELETE FROM portfolio_metadata", [])?;
        tx.execute(
            "INSERT INTO portfolio_metadata (id, metadata_json, config_json) VALUES (1, ?1, ?2)",
            params![metadata_json, config_json],
        )?;
        Ok(())
    }

    fn save_records(tx: &rusqlite::Transaction, portfolio: &Portfolio) -> PersistenceResult<()> {
        tx.execute("DELETE FROM allocations", [])?;
        tx.execute("DELETE FROM resources", [])?;

        let mut stmt =
            tx.prepare("INSERT INTO resources (position, id, resource_json) VALUES (?1, ?2, ?3)")?;
        for (position, resource) in portfolio.resources().iter().enumerate() {
            let json = serde_json::to_string(resource)?;
            stmt.execute(params![position as i64, resource.id, json])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO allocations (position, resource_id, allocation_json) VALUES (?1, ?2, ?3)",
        )?;
        for (position, allocation) in portfolio.allocations().iter().enumerate() {
            let json = serde_json::to_string(allocation)?;
            stmt.execute(params![position as i64, allocation.resource_id, json])?;
        }
        Ok(())
    }

    fn query_json<T: serde::de::DeserializeOwned>(
        connection: &Connection,
        sql: &str,
    ) -> PersistenceResult<Vec<T>> {
        let mut stmt = connection.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut records = Vec::new();
        for json in rows {
            let json = json?;
            records.push(serde_json::from_str(&json)?);
        }
        Ok(records)
    }
}

impl ResourceStore for SqliteResourceStore {
    fn list_resources(&self) -> PersistenceResult<Vec<Resource>> {
        let conn = self.lock()?;
        Self::query_json(&conn, "SELECT resource_json FROM resources ORDER BY position ASC")
    }

    fn list_allocations(&self) -> PersistenceResult<Vec<Allocation>> {
        let conn = self.lock()?;
        Self::query_json(
            &conn,
            "SELECT allocation_json FROM allocations ORDER BY position ASC",
        )
    }
}

impl PortfolioStore for SqliteResourceStore {
    fn save_portfolio(&self, portfolio: &Portfolio) -> PersistenceResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::save_metadata(&tx, portfolio.metadata(), portfolio.config())?;
        Self::save_records(&tx, portfolio)?;
        tx.commit()?;
        tracing::debug!(
            resources = portfolio.resources().len(),
            allocations = portfolio.allocations().len(),
            "portfolio saved to sqlite"
        );
        Ok(())
    }

    fn load_portfolio(&self) -> PersistenceResult<Option<Portfolio>> {
        let (metadata_json, config_json) = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT metadata_json, config_json FROM portfolio_metadata WHERE id = 1",
            )?;
            let row: Option<(String, String)> = stmt
                .query_row([], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;
            match row {
                Some(row) => row,
                None => return Ok(None),
            }
        };

        let metadata: PortfolioMetadata = serde_json::from_str(&metadata_json)?;
        let config: AnalysisConfig = serde_json::from_str(&config_json)?;
        config.validate()?;
        let resources = self.list_resources()?;
        let allocations = self.list_allocations()?;

        let portfolio = Portfolio::from_parts(metadata, config, resources, allocations)?;
        Ok(Some(portfolio))
    }
}
