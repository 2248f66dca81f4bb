//! SurrealDB implementation of the store.
//!
//! Connects through `surrealdb::engine::any`, so the same client serves the embedded
//! `mem://` engine and remote `ws://`/`wss://` servers.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{Priority, Res, StaffAssignment, StaffRole, Ticket, TicketStatus, Void},
};

use super::{GenericStoreClient, StoreClient};

// Extra methods on `StoreClient` applied by the surreal implementation.

impl StoreClient {
    /// Connect to the SurrealDB endpoint named in the config.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let credentials = match (&config.db_username, &config.db_password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        };

        let client = SurrealStoreClient::connect(&config.db_endpoint, credentials, &config.db_namespace, &config.db_database).await?;

        Ok(Self { inner: Arc::new(client) })
    }
}

// Rows.

/// A ticket as stored; the ticket ID is a field so record IDs stay SurrealDB's business.
#[derive(Debug, Serialize, Deserialize)]
struct TicketRow {
    ticket_id: String,
    title: String,
    description: String,
    department: String,
    priority: Priority,
    category: String,
    status: TicketStatus,
    #[serde(default)]
    assigned_to: Option<String>,
    /// RFC 3339.
    created_at: String,
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            department: ticket.department.clone(),
            priority: ticket.priority,
            category: ticket.category.clone(),
            status: ticket.status,
            assigned_to: ticket.assigned_to.clone(),
            created_at: ticket.created_at.to_rfc3339(),
        }
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = anyhow::Error;

    fn try_from(row: TicketRow) -> Res<Self> {
        Ok(Self {
            id: row.ticket_id,
            title: row.title,
            description: row.description,
            department: row.department,
            priority: row.priority,
            category: row.category,
            status: row.status,
            assigned_to: row.assigned_to,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StaffIdRow {
    #[allow(dead_code)]
    staff_id: String,
}

#[derive(Debug, Deserialize)]
struct TicketIdRow {
    #[allow(dead_code)]
    ticket_id: String,
}

#[derive(Debug, Deserialize)]
struct CounterRow {
    next_index: u64,
}

#[derive(Debug, Deserialize)]
struct WorkloadRow {
    assigned_to: String,
    total: u32,
}

// Specific implementations.

/// SurrealDB store implementation.
#[derive(Clone)]
pub struct SurrealStoreClient {
    db: Surreal<Any>,
}

impl SurrealStoreClient {
    /// Connect, sign in when credentials are given, and make sure indexes exist.
    #[instrument(name = "SurrealStoreClient::connect", skip(credentials))]
    pub async fn connect(endpoint: &str, credentials: Option<(&str, &str)>, namespace: &str, database: &str) -> Res<Self> {
        let db = any::connect(endpoint).await?;

        if let Some((username, password)) = credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(namespace).use_db(database).await?;

        db.query(
            "DEFINE INDEX IF NOT EXISTS ticket_id_unique ON TABLE ticket COLUMNS ticket_id UNIQUE;
             DEFINE INDEX IF NOT EXISTS ticket_assignee ON TABLE ticket COLUMNS assigned_to;
             DEFINE INDEX IF NOT EXISTS staff_department_role ON TABLE staff_assignment COLUMNS department, role;",
        )
        .await?
        .check()?;

        info!("Store connected to `{endpoint}`.");

        Ok(Self { db })
    }

    /// Atomically bump the counter `table:key` and return its new value (starting at 1).
    async fn increment(&self, table: &'static str, key: &str) -> Res<u64> {
        let mut response = self
            .db
            .query("UPSERT type::thing($table, $key) SET next_index += 1 RETURN next_index")
            .bind(("table", table))
            .bind(("key", key.to_string()))
            .await?;

        let counter: Option<CounterRow> = response.take(0)?;

        counter
            .map(|counter| counter.next_index)
            .ok_or_else(|| anyhow::anyhow!("Counter `{table}:{key}` was not written."))
    }
}

#[async_trait]
impl GenericStoreClient for SurrealStoreClient {
    #[instrument(skip(self))]
    async fn list_staff(&self, department: &str, role: StaffRole) -> Res<Vec<StaffAssignment>> {
        let mut response = self
            .db
            .query("SELECT staff_id, department, role, is_primary, position FROM staff_assignment WHERE department = $department AND role = $role ORDER BY position ASC")
            .bind(("department", department.to_string()))
            .bind(("role", role.as_str()))
            .await?;

        let staff: Vec<StaffAssignment> = response.take(0)?;

        Ok(staff)
    }

    #[instrument(skip(self))]
    async fn add_staff_assignment(&self, assignment: &StaffAssignment) -> Void {
        let mut response = self
            .db
            .query("UPDATE staff_assignment SET is_primary = $is_primary WHERE staff_id = $staff_id AND department = $department AND role = $role RETURN staff_id")
            .bind(("is_primary", assignment.is_primary))
            .bind(("staff_id", assignment.staff_id.clone()))
            .bind(("department", assignment.department.clone()))
            .bind(("role", assignment.role.as_str()))
            .await?;

        let updated: Vec<StaffIdRow> = response.take(0)?;

        if updated.is_empty() {
            // Listing order is the last assignment tie-break, so it comes from a counter rather than a clock.
            let position = self.increment("sequence", "staff_assignment").await?;

            self.db
                .query("CREATE staff_assignment SET staff_id = $staff_id, department = $department, role = $role, is_primary = $is_primary, position = $position")
                .bind(("staff_id", assignment.staff_id.clone()))
                .bind(("department", assignment.department.clone()))
                .bind(("role", assignment.role.as_str()))
                .bind(("is_primary", assignment.is_primary))
                .bind(("position", position))
                .await?
                .check()?;
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn open_workloads(&self, staff_ids: &[String]) -> Res<HashMap<String, u32>> {
        if staff_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let statuses = TicketStatus::OPEN.iter().map(|status| status.as_str()).collect::<Vec<_>>();

        let mut response = self
            .db
            .query("SELECT assigned_to, count() AS total FROM ticket WHERE assigned_to INSIDE $staff_ids AND status INSIDE $statuses GROUP BY assigned_to")
            .bind(("staff_ids", staff_ids.to_vec()))
            .bind(("statuses", statuses))
            .await?;

        let rows: Vec<WorkloadRow> = response.take(0)?;

        Ok(rows.into_iter().map(|row| (row.assigned_to, row.total)).collect())
    }

    #[instrument(skip_all, fields(ticket = %ticket.id))]
    async fn create_ticket(&self, ticket: &Ticket) -> Void {
        self.db
            .query("CREATE ticket CONTENT $row")
            .bind(("row", TicketRow::from(ticket)))
            .await?
            .check()?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_ticket(&self, ticket_id: &str) -> Res<Option<Ticket>> {
        let mut response = self
            .db
            .query("SELECT * OMIT id FROM ticket WHERE ticket_id = $ticket_id LIMIT 1")
            .bind(("ticket_id", ticket_id.to_string()))
            .await?;

        let rows: Vec<TicketRow> = response.take(0)?;

        rows.into_iter().next().map(Ticket::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn set_ticket_assignee(&self, ticket_id: &str, assignee: Option<&str>) -> Void {
        let mut response = self
            .db
            .query("UPDATE ticket SET assigned_to = $assignee WHERE ticket_id = $ticket_id RETURN ticket_id")
            .bind(("assignee", assignee.map(str::to_string)))
            .bind(("ticket_id", ticket_id.to_string()))
            .await?;

        let updated: Vec<TicketIdRow> = response.take(0)?;

        if updated.is_empty() {
            return Err(anyhow::anyhow!("Ticket `{ticket_id}` not found."));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn next_round_robin_cursor(&self, department: &str) -> Res<u64> {
        Ok(self.increment("round_robin", department).await? - 1)
    }
}

// Tests.
