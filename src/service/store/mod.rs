pub mod memory;
pub mod surreal;

use std::{collections::HashMap, ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    config::Config,
    types::{Res, StaffAssignment, StaffRole, Ticket, Void},
};

// Traits.

/// Generic store client trait that clients must implement.
///
/// This is the slice of the ticketing backend the router needs: staff rosters,
/// open-ticket counts, and reading/writing ticket routing fields. Implementing this
/// trait allows different backends to be used with the router.
#[async_trait]
pub trait GenericStoreClient: Send + Sync + 'static {
    /// Lists the staff holding `role` in `department`, in listing order.
    ///
    /// The order is stable between calls and is the final tie-break for assignment.
    async fn list_staff(&self, department: &str, role: StaffRole) -> Res<Vec<StaffAssignment>>;

    /// Adds a staff member to a department's roster.
    async fn add_staff_assignment(&self, assignment: &StaffAssignment) -> Void;

    /// Counts tickets in `open`, `in_progress` or `pending` per assignee.
    ///
    /// Staff with no open tickets may be missing from the result.
    async fn open_workloads(&self, staff_ids: &[String]) -> Res<HashMap<String, u32>>;

    /// Stores a new ticket.
    async fn create_ticket(&self, ticket: &Ticket) -> Void;

    /// Gets a ticket by its ID.
    async fn get_ticket(&self, ticket_id: &str) -> Res<Option<Ticket>>;

    /// Sets (or clears) the ticket's assignee.
    async fn set_ticket_assignee(&self, ticket_id: &str, assignee: Option<&str>) -> Void;

    /// Returns the department's round-robin cursor and advances it by one.
    ///
    /// The first call for a department returns `0`.
    async fn next_round_robin_cursor(&self, department: &str) -> Res<u64>;
}

// Structs.

/// Store client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn GenericStoreClient>,
}

impl Deref for StoreClient {
    type Target = dyn GenericStoreClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl StoreClient {
    pub fn new(inner: Arc<dyn GenericStoreClient>) -> Self {
        Self { inner }
    }

    /// Connect the store named by `db_endpoint`.
    pub async fn from_config(config: &Config) -> Res<Self> {
        if config.db_endpoint == memory::MEMORY_ENDPOINT {
            return Ok(Self::memory());
        }

        Self::surreal(config).await
    }
}
