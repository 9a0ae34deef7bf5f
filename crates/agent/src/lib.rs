//! The agent orchestrator for DataGate.
//!
//! Drives a bounded conversation loop with the LLM: send the user's intent
//! plus conversation memory and tool schemas, receive either a direct
//! answer or a tool request, execute the tool, feed the result back, and
//! repeat until a final answer arrives or the turn budget runs out.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{Orchestrator, Outcome};
