//! Policy-enforcing query execution for DataGate.
//!
//! The executor is the only place where model-generated SQL touches the
//! warehouse. Every statement passes through the textual guard (forbidden
//! keywords, comment sequences, multi-statement rejection), the table
//! allow-list, and automatic LIMIT enforcement before dispatch.

pub mod executor;
pub mod guard;

pub use executor::{QueryExecutor, QueryRequest, QueryResult};
