//! HTTP statement client for the warehouse REST gateway.
//!
//! Speaks a minimal statement API: `POST {base}/v1/statements` with a JSON
//! body carrying the SQL text and execution context, returning result rows
//! as an array of column → value objects in column order.

use async_trait::async_trait;
use datagate_core::error::ExecutionError;
use datagate_core::warehouse::{ColumnInfo, Row, Warehouse};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A warehouse reachable over its HTTP statement endpoint.
pub struct HttpWarehouse {
    base_url: String,
    token: String,
    database: String,
    schema: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWarehouse")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

impl HttpWarehouse {
    /// Create a new warehouse client.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        database: impl Into<String>,
        schema: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            database: database.into(),
            schema: schema.into(),
            timeout_secs: timeout.as_secs(),
            client,
        }
    }

    async fn post_statement(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        let url = format!("{}/v1/statements", self.base_url);
        let body = StatementRequest {
            statement: sql,
            database: &self.database,
            schema: &self.schema,
        };

        debug!(database = %self.database, schema = %self.schema, "Dispatching statement");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExecutionError::Timeout(self.timeout_secs)
                } else {
                    ExecutionError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(ExecutionError::Transport(
                "warehouse rejected credentials".into(),
            ));
        }

        if (400..500).contains(&status) {
            let detail = response
                .json::<StatementError>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("statement rejected (status {status})"));
            warn!(status, %detail, "Warehouse rejected statement");
            return Err(ExecutionError::Statement(detail));
        }

        if status != 200 {
            let detail = response.text().await.unwrap_or_default();
            warn!(status, body = %detail, "Warehouse returned error");
            return Err(ExecutionError::Transport(format!(
                "warehouse error (status {status}): {detail}"
            )));
        }

        let parsed: StatementResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::Transport(format!("failed to parse response: {e}")))?;

        Ok(parsed.rows)
    }

    /// Pull a named string column out of each result row.
    fn string_column(rows: &[Row], column: &str) -> Vec<String> {
        rows.iter()
            .filter_map(|row| row.get(column).and_then(|v| v.as_str()).map(String::from))
            .collect()
    }
}

/// Identifiers interpolated into catalog queries must be plain names.
/// Statement text itself is never interpolated.
fn validate_identifier(name: &str) -> Result<(), ExecutionError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if ok {
        Ok(())
    } else {
        Err(ExecutionError::Statement(format!(
            "invalid table name '{name}'"
        )))
    }
}

#[async_trait]
impl Warehouse for HttpWarehouse {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        self.post_statement(sql).await
    }

    async fn list_tables(&self) -> Result<Vec<String>, ExecutionError> {
        let sql = format!(
            "SELECT TABLE_NAME FROM {}.INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = '{}' ORDER BY TABLE_NAME",
            self.database, self.schema
        );
        let rows = self.post_statement(&sql).await?;
        Ok(Self::string_column(&rows, "TABLE_NAME"))
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        validate_identifier(table)?;
        let sql = format!(
            "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE \
             FROM {}.INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = '{}' AND TABLE_NAME = '{}' \
             ORDER BY ORDINAL_POSITION",
            self.database,
            self.schema,
            table.to_uppercase()
        );
        let rows = self.post_statement(&sql).await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = row.get("COLUMN_NAME")?.as_str()?.to_string();
                let data_type = row.get("DATA_TYPE")?.as_str()?.to_string();
                let nullable = row
                    .get("IS_NULLABLE")
                    .and_then(|v| v.as_str())
                    .is_some_and(|v| v.eq_ignore_ascii_case("YES"));
                Some(ColumnInfo {
                    name,
                    data_type,
                    nullable,
                })
            })
            .collect())
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    database: &'a str,
    schema: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct StatementError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warehouse() -> HttpWarehouse {
        HttpWarehouse::new(
            "http://localhost:9000/",
            "wh-token",
            "ANALYTICS",
            "PUBLIC",
            std::time::Duration::from_secs(5),
        )
    }

    #[test]
    fn trailing_slash_trimmed() {
        let wh = warehouse();
        assert_eq!(wh.base_url, "http://localhost:9000");
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", warehouse());
        assert!(!rendered.contains("wh-token"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn identifier_validation() {
        assert!(validate_identifier("ORDERS").is_ok());
        assert!(validate_identifier("order_items_2024").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("orders; DROP TABLE x").is_err());
        assert!(validate_identifier("orders'--").is_err());
    }

    #[test]
    fn parse_statement_response() {
        let data = r#"{"rows":[{"ID":1,"NAME":"widget"},{"ID":2,"NAME":"gadget"}]}"#;
        let parsed: StatementResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0]["NAME"], "widget");
        // Column order survives deserialization
        let columns: Vec<&String> = parsed.rows[0].keys().collect();
        assert_eq!(columns, ["ID", "NAME"]);
    }

    #[test]
    fn parse_empty_response() {
        let parsed: StatementResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn string_column_extraction() {
        let data = r#"{"rows":[{"TABLE_NAME":"ORDERS"},{"TABLE_NAME":"CUSTOMERS"},{"TABLE_NAME":null}]}"#;
        let parsed: StatementResponse = serde_json::from_str(data).unwrap();
        let names = HttpWarehouse::string_column(&parsed.rows, "TABLE_NAME");
        assert_eq!(names, ["ORDERS", "CUSTOMERS"]);
    }

    #[test]
    fn statement_request_serialization() {
        let req = StatementRequest {
            statement: "SELECT 1",
            database: "ANALYTICS",
            schema: "PUBLIC",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["statement"], "SELECT 1");
        assert_eq!(json["database"], "ANALYTICS");
        assert_eq!(json["schema"], "PUBLIC");
    }
}
