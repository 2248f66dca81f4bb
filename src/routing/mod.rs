//! Ticket routing: where a ticket goes and who picks it up.
//!
//! - Keyword scoring against the catalog (always available).
//! - The classification pipeline that puts the LLM in front of the keyword scorer.
//! - Workload-aware auto-assignment within a department.

pub mod assign;
pub mod classify;
pub mod keyword;
