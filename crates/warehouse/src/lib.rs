//! Warehouse access for DataGate.
//!
//! Implements the [`Warehouse`](datagate_core::Warehouse) trait over a
//! SQL-over-HTTP statement API, the transport exposed by the analytical
//! warehouse's REST gateway. Catalog operations (table listing, schema
//! description) are expressed as `INFORMATION_SCHEMA` queries on the same
//! transport.

pub mod http;

pub use http::HttpWarehouse;
