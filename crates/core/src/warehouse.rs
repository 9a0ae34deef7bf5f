//! Warehouse trait — the abstraction over the analytical data store.
//!
//! The executor treats the warehouse as stateless per call: connection and
//! session lifecycle belongs entirely to the implementation. The HTTP
//! client lives in `datagate-warehouse`; tests use in-memory fakes.

use crate::error::ExecutionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single result row: column name → value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Schema information for one column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// The warehouse collaborator contract.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Execute a SQL statement and return all rows.
    async fn execute(&self, sql: &str) -> std::result::Result<Vec<Row>, ExecutionError>;

    /// List the table names visible in the configured schema.
    async fn list_tables(&self) -> std::result::Result<Vec<String>, ExecutionError>;

    /// Describe the columns of a single table.
    async fn describe_table(
        &self,
        table: &str,
    ) -> std::result::Result<Vec<ColumnInfo>, ExecutionError>;
}
