//! ToolSurface — the closed set of operations the agent may invoke.

use crate::format;
use datagate_core::error::{Error, OrchestrationError, PolicyViolation};
use datagate_core::provider::ToolDefinition;
use datagate_core::tool::{ToolCall, ToolResult};
use datagate_core::warehouse::Warehouse;
use datagate_core::Result;
use datagate_policy::{AuditEvent, AuditLog, AuditOutcome};
use datagate_query::{QueryExecutor, QueryRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// The closed set of tools. The model names a tool by string; resolution
/// goes through this enum, never through dynamic dispatch, and unknown
/// names are an orchestration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    ListTables,
    DescribeTable,
    RunQuery,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::ListTables,
        ToolName::DescribeTable,
        ToolName::RunQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ListTables => "list_tables",
            ToolName::DescribeTable => "describe_table",
            ToolName::RunQuery => "run_query",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "list_tables" => Some(ToolName::ListTables),
            "describe_table" => Some(ToolName::DescribeTable),
            "run_query" => Some(ToolName::RunQuery),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapters between the agent loop and the warehouse.
pub struct ToolSurface {
    executor: Arc<QueryExecutor>,
    warehouse: Arc<dyn Warehouse>,
    audit: Arc<AuditLog>,
}

impl ToolSurface {
    pub fn new(
        executor: Arc<QueryExecutor>,
        warehouse: Arc<dyn Warehouse>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            executor,
            warehouse,
            audit,
        }
    }

    /// Tool schemas declared to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: ToolName::ListTables.as_str().into(),
                description: "List the tables available for querying.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
            ToolDefinition {
                name: ToolName::DescribeTable.as_str().into(),
                description: "Get the column names and types of a table. \
                              Call this before writing a query against an unfamiliar table."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "table_name": {
                            "type": "string",
                            "description": "Name of the table to describe"
                        }
                    },
                    "required": ["table_name"]
                }),
            },
            ToolDefinition {
                name: ToolName::RunQuery.as_str().into(),
                description: "Execute a read-only SQL query and return the resulting rows. \
                              Only SELECT-style statements are allowed, and results are \
                              capped at a configured row limit."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "sql": {
                            "type": "string",
                            "description": "A single SQL SELECT statement"
                        }
                    },
                    "required": ["sql"]
                }),
            },
        ]
    }

    /// Execute one tool call on behalf of `subject`.
    ///
    /// Warehouse and argument failures come back as failed tool results so
    /// the model can correct itself. Unknown tool names and policy
    /// violations are hard errors: the former because the tool set is
    /// closed, the latter because the model must not be able to negotiate
    /// around access policy.
    pub async fn dispatch(&self, call: &ToolCall, subject: &str) -> Result<ToolResult> {
        let name = ToolName::parse(&call.name).ok_or_else(|| {
            warn!(tool = %call.name, "Model requested unknown tool");
            Error::Orchestration(OrchestrationError::UnknownTool(call.name.clone()))
        })?;

        debug!(tool = %name, %subject, "Dispatching tool call");
        self.audit.log(
            AuditEvent::ToolInvoked {
                tool_name: name.as_str().into(),
            },
            subject,
            AuditOutcome::Success,
            None,
        );

        match name {
            ToolName::ListTables => Ok(self.list_tables(&call.id).await),
            ToolName::DescribeTable => self.describe_table(call, subject).await,
            ToolName::RunQuery => self.run_query(call, subject).await,
        }
    }

    async fn list_tables(&self, call_id: &str) -> ToolResult {
        match self.warehouse.list_tables().await {
            Ok(names) => {
                let policy = self.executor.policy();
                let visible: Vec<String> = if policy.has_table_restrictions() {
                    names
                        .into_iter()
                        .filter(|t| policy.is_table_allowed(t))
                        .collect()
                } else {
                    names
                };
                ToolResult::ok(call_id, format::tables(&visible))
            }
            Err(e) => ToolResult::failed(call_id, format!("Could not list tables: {e}")),
        }
    }

    async fn describe_table(&self, call: &ToolCall, _subject: &str) -> Result<ToolResult> {
        let Some(table) = call.arguments.get("table_name").and_then(|v| v.as_str()) else {
            return Ok(ToolResult::failed(
                &call.id,
                "Missing required argument 'table_name'.",
            ));
        };

        if !self.executor.policy().is_table_allowed(table) {
            return Err(Error::Policy(PolicyViolation::TableNotAllowed(
                table.to_string(),
            )));
        }

        match self.warehouse.describe_table(table).await {
            Ok(cols) => Ok(ToolResult::ok(&call.id, format::columns(table, &cols))),
            Err(e) => Ok(ToolResult::failed(
                &call.id,
                format!("Could not describe table '{table}': {e}"),
            )),
        }
    }

    async fn run_query(&self, call: &ToolCall, subject: &str) -> Result<ToolResult> {
        let Some(sql) = call.arguments.get("sql").and_then(|v| v.as_str()) else {
            return Ok(ToolResult::failed(
                &call.id,
                "Missing required argument 'sql'.",
            ));
        };

        let request = QueryRequest {
            sql: sql.to_string(),
            subject: subject.to_string(),
        };

        match self.executor.execute(&request).await {
            Ok(result) => Ok(ToolResult::ok(&call.id, format::query_result(&result))),
            // Execution failures are model-correctable; policy rejections
            // are not negotiable and escape the loop.
            Err(Error::Execution(e)) => Ok(ToolResult::failed(
                &call.id,
                format!("Query failed: {e}"),
            )),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use datagate_core::error::ExecutionError;
    use datagate_core::warehouse::{ColumnInfo, Row};
    use datagate_policy::AccessPolicy;
    use std::time::Duration;

    struct FakeWarehouse {
        fail: bool,
    }

    #[async_trait]
    impl Warehouse for FakeWarehouse {
        async fn execute(&self, _sql: &str) -> std::result::Result<Vec<Row>, ExecutionError> {
            if self.fail {
                return Err(ExecutionError::Statement("syntax error".into()));
            }
            let mut row = Row::new();
            row.insert("TOTAL".into(), serde_json::json!(42));
            Ok(vec![row])
        }

        async fn list_tables(&self) -> std::result::Result<Vec<String>, ExecutionError> {
            if self.fail {
                return Err(ExecutionError::Transport("unreachable".into()));
            }
            Ok(vec!["ORDERS".into(), "CUSTOMERS".into(), "SECRETS".into()])
        }

        async fn describe_table(
            &self,
            _table: &str,
        ) -> std::result::Result<Vec<ColumnInfo>, ExecutionError> {
            Ok(vec![ColumnInfo {
                name: "ID".into(),
                data_type: "NUMBER".into(),
                nullable: false,
            }])
        }
    }

    fn surface(tables: &[&str], fail: bool) -> ToolSurface {
        let warehouse: Arc<dyn Warehouse> = Arc::new(FakeWarehouse { fail });
        let policy = AccessPolicy::new(
            tables.iter().map(|t| t.to_string()),
            100,
            vec!["DROP".to_string(), "DELETE".to_string()],
        );
        let audit = Arc::new(AuditLog::new());
        let executor = Arc::new(QueryExecutor::new(
            warehouse.clone(),
            policy,
            audit.clone(),
            Duration::from_secs(5),
        ));
        ToolSurface::new(executor, warehouse, audit)
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn definitions_cover_all_tools() {
        let surface = surface(&[], false);
        let defs = surface.definitions();
        assert_eq!(defs.len(), ToolName::ALL.len());
        for name in ToolName::ALL {
            assert!(defs.iter().any(|d| d.name == name.as_str()));
        }
    }

    #[test]
    fn tool_name_round_trip() {
        for name in ToolName::ALL {
            assert_eq!(ToolName::parse(name.as_str()), Some(name));
        }
        assert_eq!(ToolName::parse("drop_table"), None);
    }

    #[tokio::test]
    async fn unknown_tool_is_hard_error() {
        let surface = surface(&[], false);
        let err = surface
            .dispatch(&call("drop_table", serde_json::json!({})), "analyst")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Orchestration(OrchestrationError::UnknownTool(_))
        ));
    }

    #[tokio::test]
    async fn list_tables_filters_by_allowlist() {
        let surface = surface(&["orders", "customers"], false);
        let result = surface
            .dispatch(&call("list_tables", serde_json::json!({})), "analyst")
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("ORDERS"));
        assert!(!result.output.contains("SECRETS"));
    }

    #[tokio::test]
    async fn list_tables_failure_is_soft() {
        let surface = surface(&[], true);
        let result = surface
            .dispatch(&call("list_tables", serde_json::json!({})), "analyst")
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Could not list tables"));
    }

    #[tokio::test]
    async fn describe_disallowed_table_is_hard_error() {
        let surface = surface(&["orders"], false);
        let err = surface
            .dispatch(
                &call("describe_table", serde_json::json!({"table_name": "secrets"})),
                "analyst",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Policy(PolicyViolation::TableNotAllowed(_))
        ));
    }

    #[tokio::test]
    async fn describe_missing_argument_is_soft() {
        let surface = surface(&[], false);
        let result = surface
            .dispatch(&call("describe_table", serde_json::json!({})), "analyst")
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("table_name"));
    }

    #[tokio::test]
    async fn run_query_success() {
        let surface = surface(&[], false);
        let result = surface
            .dispatch(
                &call("run_query", serde_json::json!({"sql": "SELECT SUM(x) AS TOTAL FROM t"})),
                "analyst",
            )
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("42"));
    }

    #[tokio::test]
    async fn run_query_statement_failure_is_soft() {
        let surface = surface(&[], true);
        let result = surface
            .dispatch(
                &call("run_query", serde_json::json!({"sql": "SELECT * FROM t"})),
                "analyst",
            )
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("syntax error"));
    }

    #[tokio::test]
    async fn run_query_policy_violation_escapes() {
        let surface = surface(&[], false);
        let err = surface
            .dispatch(
                &call("run_query", serde_json::json!({"sql": "DROP TABLE t"})),
                "analyst",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Policy(_)));
    }
}
