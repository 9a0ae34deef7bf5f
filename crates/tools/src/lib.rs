//! The tool surface exposed to the LLM agent.
//!
//! A fixed set of schema-described operations is all the model can do:
//! list tables, describe a table's schema, run a query. Tool names form a
//! closed set; an unknown name is an orchestration error, never a dynamic
//! dispatch. Warehouse failures are folded into failed tool results so the
//! model can self-correct, while policy violations escape as hard failures.

pub mod format;
pub mod surface;

pub use surface::{ToolName, ToolSurface};
