//! Request pipeline — the end-to-end path for one inbound request.
//!
//! Stage order is fixed: credential gate, then session lookup, then the
//! agent loop (which enforces policy on every query it attempts). Requests
//! from different identities run independently and concurrently; the only
//! shared mutable state is the rate windows and the session map.

use datagate_agent::{Orchestrator, Outcome};
use datagate_core::error::{Error, ExecutionError, OrchestrationError, PolicyViolation};
use datagate_core::message::{Conversation, Message, SessionId};
use datagate_core::warehouse::{ColumnInfo, Warehouse};
use datagate_core::{Principal, Result};
use datagate_policy::{AuditEvent, AuditLog, AuditOutcome, CredentialGate};
use datagate_query::QueryExecutor;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// The answer to one submitted question.
#[derive(Debug)]
pub struct QueryOutcome {
    /// Session the exchange ran under; pass it back to continue the
    /// conversation.
    pub session_id: SessionId,

    /// How the exchange ended.
    pub outcome: Outcome,
}

/// Wires the credential gate, session store, and agent loop together.
pub struct Pipeline {
    gate: CredentialGate,
    orchestrator: Orchestrator,
    executor: Arc<QueryExecutor>,
    warehouse: Arc<dyn Warehouse>,
    audit: Arc<AuditLog>,
    sessions: RwLock<HashMap<SessionId, Conversation>>,
    request_timeout: Duration,
    max_sessions: usize,
}

impl Pipeline {
    pub fn new(
        gate: CredentialGate,
        orchestrator: Orchestrator,
        executor: Arc<QueryExecutor>,
        warehouse: Arc<dyn Warehouse>,
        audit: Arc<AuditLog>,
        request_timeout: Duration,
        max_sessions: usize,
    ) -> Self {
        Self {
            gate,
            orchestrator,
            executor,
            warehouse,
            audit,
            sessions: RwLock::new(HashMap::new()),
            request_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn gate(&self) -> &CredentialGate {
        &self.gate
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Admit the request, auditing gate rejections.
    fn admit(&self, token: Option<&str>) -> Result<Principal> {
        match self.gate.admit(token) {
            Ok(principal) => Ok(principal),
            Err(e) => {
                let event = match &e {
                    Error::RateLimit(_) => AuditEvent::RateLimited,
                    _ => AuditEvent::AuthFailure,
                };
                let actor = match &e {
                    Error::RateLimit(_) => "known",
                    _ => "anonymous",
                };
                self.audit.log(event, actor, AuditOutcome::Denied, None);
                Err(e)
            }
        }
    }

    /// Run one natural-language question through the agent.
    ///
    /// The session's conversation is taken out of the map for the duration
    /// of the exchange so the lock is never held across an await; two
    /// concurrent requests for the same session run on divergent copies,
    /// last writer wins.
    pub async fn submit_query(
        &self,
        token: Option<&str>,
        question: &str,
        session_id: Option<SessionId>,
    ) -> Result<QueryOutcome> {
        let principal = self.admit(token)?;

        let session_id = session_id.unwrap_or_default();
        let mut conversation = {
            let mut sessions = self.sessions.write().await;
            sessions
                .remove(&session_id)
                .unwrap_or_else(|| Conversation::with_id(session_id.clone()))
        };

        info!(
            subject = %principal.subject,
            session = %session_id,
            "Query submitted"
        );
        conversation.push(Message::user(question));

        // The per-call provider and warehouse timeouts bound each hop;
        // this deadline bounds the whole exchange so a slow model cannot
        // stack max_turns worth of per-call budgets.
        let result = match tokio::time::timeout(
            self.request_timeout,
            self.orchestrator.run(&mut conversation, &principal.subject),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    session = %session_id,
                    timeout_secs = self.request_timeout.as_secs(),
                    "Request deadline elapsed"
                );
                Err(Error::Orchestration(OrchestrationError::Timeout(
                    self.request_timeout.as_secs(),
                )))
            }
        };

        // The conversation is retained even when the exchange failed, so
        // the user can follow up in the same session.
        self.store_session(session_id.clone(), conversation).await;

        Ok(QueryOutcome {
            session_id,
            outcome: result?,
        })
    }

    /// Tables visible to the caller, filtered by the access policy.
    pub async fn list_tables(&self, token: Option<&str>) -> Result<Vec<String>> {
        let principal = self.admit(token)?;
        debug!(subject = %principal.subject, "Listing tables");

        let names = self
            .bounded(self.warehouse.list_tables())
            .await
            .map_err(Error::Execution)?;
        let policy = self.executor.policy();
        if !policy.has_table_restrictions() {
            return Ok(names);
        }
        Ok(names
            .into_iter()
            .filter(|t| policy.is_table_allowed(t))
            .collect())
    }

    /// Column schema for one table, subject to the access policy.
    pub async fn describe_table(
        &self,
        token: Option<&str>,
        table: &str,
    ) -> Result<Vec<ColumnInfo>> {
        let principal = self.admit(token)?;
        debug!(subject = %principal.subject, %table, "Describing table");

        if !self.executor.policy().is_table_allowed(table) {
            self.audit.log(
                AuditEvent::PolicyRejected {
                    rule: format!("table '{table}' not in allow-list"),
                },
                &principal.subject,
                AuditOutcome::Denied,
                None,
            );
            return Err(Error::Policy(PolicyViolation::TableNotAllowed(
                table.to_string(),
            )));
        }

        self.bounded(self.warehouse.describe_table(table))
            .await
            .map_err(Error::Execution)
    }

    /// Apply the request deadline to one warehouse metadata call.
    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = std::result::Result<T, ExecutionError>>,
    ) -> std::result::Result<T, ExecutionError> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .unwrap_or_else(|_| Err(ExecutionError::Timeout(self.request_timeout.as_secs())))
    }

    /// Number of sessions currently retained.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn store_session(&self, id: SessionId, conversation: Conversation) {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions && !sessions.contains_key(&id) {
            // Evict the stalest session when at capacity
            if let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, c)| c.updated_at)
                .map(|(id, _)| id.clone())
            {
                debug!(session = %oldest, "Evicting stale session");
                sessions.remove(&oldest);
            }
        }
        sessions.insert(id, conversation);
    }
}
