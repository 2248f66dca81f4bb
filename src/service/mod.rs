//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by the helpdesk router:
//! - The HTTP API (axum)
//! - LLM services (e.g., OpenAI)
//! - Ticket and staff storage (e.g., SurrealDB, in-memory)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod api;
pub mod llm;
pub mod store;
