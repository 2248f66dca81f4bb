//! Request handling for the helpdesk router.
//!
//! This module coordinates the routing pieces into user-facing flows:
//! - Intake of new tickets (classify, store, assign) and reassignment.
//! - Summaries of tickets and conversations.

pub mod intake;
pub mod summarize;
