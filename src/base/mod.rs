//! Core components, types, and utilities for the helpdesk router.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The routing catalog (department and priority keyword tables).
//! - System prompts and directives for LLM interactions.
//! - Common types and result handling.

pub mod catalog;
pub mod config;
pub mod prompts;
pub mod types;
