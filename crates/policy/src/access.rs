//! AccessPolicy — the static access policy snapshot.
//!
//! Loaded once at startup from config, read-only thereafter, shared by all
//! requests. Keyword matching is case-insensitive token matching against a
//! fixed denylist; it is a coarse textual guard, not a SQL parser.

use datagate_config::PolicyConfig;
use std::collections::HashSet;

/// Immutable access policy: allowed tables, row cap, forbidden keywords.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// Uppercased table names. Empty = all tables permitted
    /// (explicit wildcard convention).
    allowed_tables: HashSet<String>,

    /// Hard cap on rows returned per query. Always ≥ 1.
    max_rows: u32,

    /// Uppercased statement keywords that reject a query outright.
    blocked_keywords: Vec<String>,
}

impl AccessPolicy {
    pub fn new(
        allowed_tables: impl IntoIterator<Item = String>,
        max_rows: u32,
        blocked_keywords: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            allowed_tables: allowed_tables
                .into_iter()
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect(),
            max_rows: max_rows.max(1),
            blocked_keywords: blocked_keywords
                .into_iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(
            config.allowed_tables.clone(),
            config.max_rows,
            config.blocked_keywords.clone(),
        )
    }

    /// Whether the allow-list permits this table. An empty allow-list
    /// permits everything.
    pub fn is_table_allowed(&self, name: &str) -> bool {
        if self.allowed_tables.is_empty() {
            return true;
        }
        // Qualified names match on their final segment as well, so an
        // allow-list entry "ORDERS" admits "ANALYTICS.PUBLIC.ORDERS".
        let upper = name.trim().to_uppercase();
        if self.allowed_tables.contains(&upper) {
            return true;
        }
        upper
            .rsplit('.')
            .next()
            .is_some_and(|last| self.allowed_tables.contains(last))
    }

    /// Whether table restrictions are in effect.
    pub fn has_table_restrictions(&self) -> bool {
        !self.allowed_tables.is_empty()
    }

    /// The maximum number of rows any query may return.
    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    /// The first forbidden keyword appearing in `sql` as a standalone
    /// token, if any. Case-insensitive.
    pub fn forbidden_keyword(&self, sql: &str) -> Option<&str> {
        let upper = sql.to_uppercase();
        let tokens: HashSet<&str> = upper
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .collect();
        self.blocked_keywords
            .iter()
            .find(|k| tokens.contains(k.as_str()))
            .map(String::as_str)
    }
}
