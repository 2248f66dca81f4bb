//! In-process store.
//!
//! Everything lives in a single mutex-guarded struct and disappears with the process.
//! Used by tests and by `db_endpoint = "memory"`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::base::types::{Res, StaffAssignment, StaffRole, Ticket, Void};

use super::{GenericStoreClient, StoreClient};

/// Endpoint value that selects this store.
pub const MEMORY_ENDPOINT: &str = "memory";

// Extra methods on `StoreClient` applied by the memory implementation.

impl StoreClient {
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(MemoryStoreClient::default()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    staff: Vec<StaffAssignment>,
    tickets: Vec<Ticket>,
    cursors: HashMap<String, u64>,
}

/// In-memory store implementation.
#[derive(Debug, Default)]
pub struct MemoryStoreClient {
    state: Mutex<MemoryState>,
}

#[async_trait]
impl GenericStoreClient for MemoryStoreClient {
    async fn list_staff(&self, department: &str, role: StaffRole) -> Res<Vec<StaffAssignment>> {
        let state = self.state.lock().await;

        Ok(state.staff.iter().filter(|s| s.department == department && s.role == role).cloned().collect())
    }

    async fn add_staff_assignment(&self, assignment: &StaffAssignment) -> Void {
        let mut state = self.state.lock().await;

        // Re-adding the same staff/department/role pair updates it in place.
        let existing = state
            .staff
            .iter()
            .position(|s| s.staff_id == assignment.staff_id && s.department == assignment.department && s.role == assignment.role);

        match existing {
            Some(index) => state.staff[index].is_primary = assignment.is_primary,
            None => state.staff.push(assignment.clone()),
        }

        Ok(())
    }

    async fn open_workloads(&self, staff_ids: &[String]) -> Res<HashMap<String, u32>> {
        let state = self.state.lock().await;
        let mut workloads = HashMap::new();

        for ticket in state.tickets.iter().filter(|t| t.status.counts_toward_workload()) {
            if let Some(assignee) = &ticket.assigned_to
                && staff_ids.contains(assignee)
            {
                *workloads.entry(assignee.clone()).or_insert(0) += 1;
            }
        }

        Ok(workloads)
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Void {
        let mut state = self.state.lock().await;

        if state.tickets.iter().any(|t| t.id == ticket.id) {
            return Err(anyhow::anyhow!("Ticket `{}` already exists.", ticket.id));
        }

        state.tickets.push(ticket.clone());

        Ok(())
    }

    async fn get_ticket(&self, ticket_id: &str) -> Res<Option<Ticket>> {
        let state = self.state.lock().await;

        Ok(state.tickets.iter().find(|t| t.id == ticket_id).cloned())
    }

    async fn set_ticket_assignee(&self, ticket_id: &str, assignee: Option<&str>) -> Void {
        let mut state = self.state.lock().await;

        let ticket = state
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or_else(|| anyhow::anyhow!("Ticket `{ticket_id}` not found."))?;

        ticket.assigned_to = assignee.map(str::to_string);

        Ok(())
    }

    async fn next_round_robin_cursor(&self, department: &str) -> Res<u64> {
        let mut state = self.state.lock().await;
        let cursor = state.cursors.entry(department.to_string()).or_insert(0);

        let current = *cursor;
        *cursor += 1;

        Ok(current)
    }
}

// Tests.
