//! QueryExecutor — validated, bounded dispatch to the warehouse.

use crate::guard;
use datagate_core::error::{ExecutionError, PolicyViolation};
use datagate_core::warehouse::{Row, Warehouse};
use datagate_core::{Error, Result};
use datagate_policy::{AccessPolicy, AuditEvent, AuditLog, AuditOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One query execution request.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Raw SQL text, exactly as the model produced it
    pub sql: String,

    /// The subject of the admitted principal, for logging and audit
    pub subject: String,
}

/// A bounded tabular result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in result order (from the first row)
    pub columns: Vec<String>,

    /// Rows, each a column → value mapping in column order
    pub rows: Vec<Row>,

    /// Number of rows returned (after clipping)
    pub row_count: usize,

    /// True iff the underlying result reached the enforced limit and may
    /// have been clipped. Reaching the cap is treated as evidence of
    /// truncation.
    pub truncated: bool,
}

/// Applies the access policy to a statement and executes it.
pub struct QueryExecutor {
    warehouse: Arc<dyn Warehouse>,
    policy: AccessPolicy,
    audit: Arc<AuditLog>,
    statement_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        policy: AccessPolicy,
        audit: Arc<AuditLog>,
        statement_timeout: Duration,
    ) -> Self {
        Self {
            warehouse,
            policy,
            audit,
            statement_timeout,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Validate, bound, and execute one statement.
    ///
    /// Order matters: the keyword guard runs before anything else so a
    /// mutating statement never reaches table extraction, and the
    /// warehouse is never invoked for a rejected statement.
    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryResult> {
        if let Some(keyword) = self.policy.forbidden_keyword(&request.sql) {
            return Err(self.reject(
                request,
                PolicyViolation::ForbiddenKeyword(keyword.to_string()),
            ));
        }

        if let Err(violation) = guard::scan_statement(&request.sql) {
            return Err(self.reject(request, violation));
        }

        if self.policy.has_table_restrictions() {
            for table in guard::referenced_tables(&request.sql) {
                if !self.policy.is_table_allowed(&table) {
                    return Err(self.reject(request, PolicyViolation::TableNotAllowed(table)));
                }
            }
        }

        let (bounded_sql, limit) = guard::enforce_limit(&request.sql, self.policy.max_rows());
        debug!(subject = %request.subject, sql = %bounded_sql, limit, "Dispatching statement");

        let rows = match tokio::time::timeout(
            self.statement_timeout,
            self.warehouse.execute(&bounded_sql),
        )
        .await
        {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                warn!(subject = %request.subject, error = %e, "Warehouse execution failed");
                self.audit.log(
                    AuditEvent::QueryExecuted {
                        rows: 0,
                        truncated: false,
                    },
                    &request.subject,
                    AuditOutcome::Failure,
                    Some(e.to_string()),
                );
                return Err(Error::Execution(e));
            }
            Err(_) => {
                let timeout = ExecutionError::Timeout(self.statement_timeout.as_secs());
                warn!(subject = %request.subject, "Warehouse call timed out");
                return Err(Error::Execution(timeout));
            }
        };

        let result = Self::bound_result(rows, limit);
        info!(
            subject = %request.subject,
            rows = result.row_count,
            truncated = result.truncated,
            "Query executed"
        );
        self.audit.log(
            AuditEvent::QueryExecuted {
                rows: result.row_count,
                truncated: result.truncated,
            },
            &request.subject,
            AuditOutcome::Success,
            None,
        );

        Ok(result)
    }

    fn reject(&self, request: &QueryRequest, violation: PolicyViolation) -> Error {
        warn!(subject = %request.subject, violation = %violation, "Statement rejected by policy");
        self.audit.log(
            AuditEvent::PolicyRejected {
                rule: violation.to_string(),
            },
            &request.subject,
            AuditOutcome::Denied,
            None,
        );
        Error::Policy(violation)
    }

    /// Clip rows to the enforced limit and derive the truncation flag.
    fn bound_result(mut rows: Vec<Row>, limit: u32) -> QueryResult {
        let limit = limit as usize;
        let clipped = rows.len() > limit;
        if clipped {
            rows.truncate(limit);
        }
        let truncated = clipped || (limit > 0 && rows.len() == limit);
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        QueryResult {
            columns,
            row_count: rows.len(),
            truncated,
            rows,
        }
    }
}
