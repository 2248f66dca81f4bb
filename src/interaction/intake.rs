//! Ticket intake: classify, store, then assign.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    base::types::{ClassificationRequest, ClassificationResult, Res, Ticket, TicketStatus},
    routing::{assign::AutoAssigner, classify::Classifier},
    service::store::StoreClient,
};

/// A ticket as submitted by a requester.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTicket {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// What intake did with a new ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeOutcome {
    pub ticket: Ticket,
    pub classification: ClassificationResult,
}

/// Classify, store, and assign a newly submitted ticket.
#[instrument(skip_all)]
pub async fn handle_new_ticket(new_ticket: NewTicket, classifier: &Classifier, store: &StoreClient, assigner: &AutoAssigner) -> Res<IntakeOutcome> {
    let request = ClassificationRequest::new(new_ticket.title.clone(), new_ticket.description.clone());
    let classification = classifier.classify(&request).await;

    let mut ticket = Ticket {
        id: Uuid::new_v4().to_string(),
        title: new_ticket.title,
        description: new_ticket.description,
        department: classification.department.clone(),
        priority: classification.priority,
        category: classification.category.clone(),
        status: TicketStatus::Open,
        assigned_to: None,
        created_at: Utc::now(),
    };

    store.create_ticket(&ticket).await?;

    // The ticket already exists; an assignment failure leaves it unassigned for manual triage.
    ticket.assigned_to = match assigner.assign_and_record(&ticket).await {
        Ok(assignee) => assignee,
        Err(err) => {
            warn!("Assignment failed for ticket `{}`, leaving it unassigned: {err}", ticket.id);
            None
        }
    };

    info!("Ticket `{}` routed to `{}`.", ticket.id, ticket.department);

    Ok(IntakeOutcome { ticket, classification })
}

/// Rerun assignment for an existing ticket and persist the result.
///
/// Fails when the ticket does not exist.
#[instrument(skip(store, assigner))]
pub async fn reassign_ticket(ticket_id: &str, store: &StoreClient, assigner: &AutoAssigner) -> Res<Option<String>> {
    let ticket = store.get_ticket(ticket_id).await?.ok_or_else(|| TicketNotFound(ticket_id.to_string()))?;

    assigner.assign_and_record(&ticket).await
}

/// Returned (inside `anyhow::Error`) when a ticket ID is unknown.
#[derive(Debug)]
pub struct TicketNotFound(pub String);

impl std::fmt::Display for TicketNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ticket `{}` not found.", self.0)
    }
}

impl std::error::Error for TicketNotFound {}

// Tests.
