//! LLM provider implementations for DataGate.
//!
//! Implements the [`Provider`](datagate_core::Provider) trait:
//! - **OpenAiCompatProvider**: any OpenAI-compatible `/v1/chat/completions`
//!   endpoint (vLLM, Ollama, OpenAI, OpenRouter, Together AI)
//! - **RetryProvider**: wraps another provider with bounded retries and
//!   exponential backoff on transient failures

pub mod openai_compat;
pub mod retry;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;
