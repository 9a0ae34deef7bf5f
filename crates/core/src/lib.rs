//! Core domain types and traits for DataGate.
//!
//! This crate defines the shared vocabulary of the gateway:
//! - `Principal` — the authenticated identity behind every gated operation
//! - `Message` / `Conversation` — the bounded conversation memory
//! - `Provider` — the abstraction over the LLM collaborator
//! - `Warehouse` — the abstraction over the analytical data store
//! - `ToolCall` / `ToolResult` — values exchanged between the agent loop
//!   and the tool surface
//! - The error taxonomy every other crate maps into

pub mod error;
pub mod message;
pub mod principal;
pub mod provider;
pub mod tool;
pub mod warehouse;

pub use error::{Error, Result};
pub use principal::Principal;
pub use provider::Provider;
pub use warehouse::Warehouse;
