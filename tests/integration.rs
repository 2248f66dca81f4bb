#![cfg(test)]

use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_router::{
    base::{
        config::{Config, ConfigInner},
        types::{ClassificationContext, ClassificationSource, Priority, Res, StaffAssignment, StaffRole, SummaryContext, SummaryRequest, TicketStatus},
    },
    interaction::intake::{self, NewTicket},
    routing::assign::AssignmentStrategy,
    runtime::Runtime,
    service::{
        llm::{GenericLlmClient, LlmClient},
        store::StoreClient,
    },
};
use mockall::mock;

// Mocks.

// Mock LLM client for testing.

mock! {
    pub Llm {}

    #[async_trait]
    impl GenericLlmClient for Llm {
        async fn get_classification_response(&self, context: &ClassificationContext) -> Res<String>;
        async fn get_summary_response(&self, context: &SummaryContext) -> Res<String>;
    }
}

fn answering_llm(classification: &'static str, summary: &'static str) -> MockLlm {
    let mut mock = MockLlm::new();

    mock.expect_get_classification_response().returning(move |_| Ok(classification.to_string()));
    mock.expect_get_summary_response().returning(move |_| Ok(summary.to_string()));

    mock
}

fn failing_llm() -> MockLlm {
    let mut mock = MockLlm::new();

    mock.expect_get_classification_response().returning(|_| Err(anyhow::anyhow!("429 Too Many Requests")));
    mock.expect_get_summary_response().returning(|_| Err(anyhow::anyhow!("429 Too Many Requests")));

    mock
}

/// Helper function to setup the test environment.
async fn setup_test_environment(llm: Option<MockLlm>, strategy: AssignmentStrategy, store: StoreClient) -> Runtime {
    let config = Config::from(ConfigInner {
        openai_api_key: Some("test_key".to_string()),
        assignment_strategy: strategy,
        db_endpoint: "memory".to_string(),
        ..Default::default()
    });

    let llm = llm.map(|llm| LlmClient::new(Arc::new(llm)));

    let runtime = Runtime::with_services(config, store, llm).expect("Failed to build runtime");

    // Seed the rosters.
    for (staff_id, department, role, is_primary) in [
        ("it-1", "IT Services", StaffRole::SupportAgent, false),
        ("it-2", "IT Services", StaffRole::SupportAgent, false),
        ("it-admin", "IT Services", StaffRole::DepartmentAdmin, false),
        ("rv-1", "Residential Village (RV)", StaffRole::SupportAgent, false),
        ("rv-2", "Residential Village (RV)", StaffRole::SupportAgent, true),
        ("fm-admin", "Facilities Management", StaffRole::DepartmentAdmin, false),
    ] {
        runtime
            .store
            .add_staff_assignment(&StaffAssignment {
                staff_id: staff_id.to_string(),
                department: department.to_string(),
                role,
                is_primary,
            })
            .await
            .expect("Failed to seed staff");
    }

    runtime
}

async fn submit(runtime: &Runtime, title: &str, description: &str) -> intake::IntakeOutcome {
    let new_ticket = NewTicket {
        title: title.to_string(),
        description: description.to_string(),
    };

    intake::handle_new_ticket(new_ticket, &runtime.classifier, &runtime.store, &runtime.assigner)
        .await
        .expect("Failed to handle ticket")
}

#[tokio::test]
async fn test_ai_classification_routes_and_assigns() {
    let llm = answering_llm(r#"{"department":"IT Services","priority":"high","category":"Network Access","confidence":0.91}"#, "Wifi outage.");
    let runtime = setup_test_environment(Some(llm), AssignmentStrategy::Workload, StoreClient::memory()).await;

    let first = submit(&runtime, "Cannot connect", "My laptop will not join eduroam").await;
    let second = submit(&runtime, "Cannot connect", "Same here").await;

    assert_eq!(first.classification.source, ClassificationSource::Ai);
    assert_eq!(first.ticket.department, "IT Services");
    assert_eq!(first.ticket.priority, Priority::High);
    assert_eq!(first.ticket.category, "Network Access");
    assert_eq!(first.ticket.status, TicketStatus::Open);

    // Workload balancing spreads consecutive tickets.
    assert_eq!(first.ticket.assigned_to.as_deref(), Some("it-1"));
    assert_eq!(second.ticket.assigned_to.as_deref(), Some("it-2"));

    let stored = runtime.store.get_ticket(&first.ticket.id).await.unwrap().expect("Ticket not stored");
    assert_eq!(stored.assigned_to.as_deref(), Some("it-1"));
}

#[tokio::test]
async fn test_llm_failure_falls_back_to_keywords() {
    let runtime = setup_test_environment(Some(failing_llm()), AssignmentStrategy::Workload, StoreClient::memory()).await;

    let outcome = submit(&runtime, "URGENT: flood in my hostel room", "Water everywhere in V4").await;

    assert_eq!(outcome.classification.source, ClassificationSource::Local);
    assert_eq!(outcome.ticket.department, "Residential Village (RV)");
    assert_eq!(outcome.ticket.priority, Priority::Urgent);
    assert_eq!(outcome.ticket.assigned_to.as_deref(), Some("rv-2"));

    let summary = runtime
        .summarizer
        .summarize(&SummaryRequest::Ticket {
            title: None,
            description: "Water everywhere in V4. Please send help.".to_string(),
        })
        .await;

    assert_eq!(summary, "Water everywhere in V4.");
}

#[tokio::test]
async fn test_escalation_sends_urgent_tickets_to_admin() {
    let llm = answering_llm(r#"{"department":"IT Services","priority":"urgent","category":"Security","confidence":0.8}"#, "");
    let runtime = setup_test_environment(Some(llm), AssignmentStrategy::PriorityEscalation, StoreClient::memory()).await;

    let outcome = submit(&runtime, "Phishing", "Someone is sending fake password reset emails").await;

    assert_eq!(outcome.ticket.assigned_to.as_deref(), Some("it-admin"));
}

#[tokio::test]
async fn test_admin_only_department_and_reassignment() {
    let llm = answering_llm(r#"{"department":"Facilities Management","priority":"medium","category":"Lifts","confidence":0.7}"#, "");
    let runtime = setup_test_environment(Some(llm), AssignmentStrategy::Workload, StoreClient::memory()).await;

    let outcome = submit(&runtime, "Lift", "Block 3 lift is making noises").await;
    assert_eq!(outcome.ticket.assigned_to.as_deref(), Some("fm-admin"));

    runtime
        .store
        .add_staff_assignment(&StaffAssignment {
            staff_id: "fm-1".to_string(),
            department: "Facilities Management".to_string(),
            role: StaffRole::SupportAgent,
            is_primary: false,
        })
        .await
        .unwrap();

    let assignee = intake::reassign_ticket(&outcome.ticket.id, &runtime.store, &runtime.assigner).await.unwrap();
    assert_eq!(assignee.as_deref(), Some("fm-1"));
}

#[tokio::test]
async fn test_round_robin_against_surreal_memory() {
    let config = Config::from(ConfigInner::default());
    let store = StoreClient::from_config(&config).await.expect("Failed to open embedded store");
    let runtime = setup_test_environment(None, AssignmentStrategy::RoundRobin, store).await;

    let mut picks = Vec::new();
    for _ in 0..3 {
        let outcome = submit(&runtime, "Aircon broke", "My V4 room is too hot").await;
        picks.push(outcome.ticket.assigned_to.expect("Ticket was not assigned"));
    }

    assert_eq!(picks.len(), 3);
    assert_ne!(picks[0], picks[1]);
    assert_eq!(picks[0], picks[2]);
}
