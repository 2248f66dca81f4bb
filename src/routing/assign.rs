//! Workload-aware auto-assignment.
//!
//! Picks one owner for a ticket that already has a department. Agents are ranked by
//! primary flag, then open workload, then listing order. Departments without agents
//! fall back to their first admin, and departments without either stay unassigned.
//!
//! Decisions are point-in-time: two tickets assigned at nearly the same moment may
//! both see the same workload snapshot.

use std::{cmp::Reverse, collections::HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    base::types::{Res, StaffAssignment, StaffRole, Ticket},
    service::store::StoreClient,
};

/// How the assigner chooses among a department's agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// Primary agents first, then least loaded.
    #[default]
    Workload,
    /// `high`/`urgent` tickets go to a department admin first; everything else as `Workload`.
    PriorityEscalation,
    /// Rotate through agents using a per-department cursor kept in the store.
    RoundRobin,
}

/// Rank agents: primary first, then least open work, then original order.
///
/// Agents missing from `workloads` count as having no open tickets.
pub fn rank_agents<'a>(agents: &'a [StaffAssignment], workloads: &HashMap<String, u32>) -> Vec<&'a StaffAssignment> {
    let mut ranked = agents.iter().collect::<Vec<_>>();

    // `sort_by_key` is stable, which keeps listing order as the last tie-break.
    ranked.sort_by_key(|agent| (Reverse(agent.is_primary), workloads.get(&agent.staff_id).copied().unwrap_or(0)));

    ranked
}

/// The most preferred agent, if any.
pub fn select_agent(agents: &[StaffAssignment], workloads: &HashMap<String, u32>) -> Option<String> {
    rank_agents(agents, workloads).first().map(|agent| agent.staff_id.clone())
}

/// Auto-assigner for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct AutoAssigner {
    store: StoreClient,
    strategy: AssignmentStrategy,
}

impl AutoAssigner {
    pub fn new(store: StoreClient, strategy: AssignmentStrategy) -> Self {
        Self { store, strategy }
    }

    pub fn strategy(&self) -> AssignmentStrategy {
        self.strategy
    }

    /// Decide who should own `ticket`. `Ok(None)` means nobody is eligible.
    #[instrument(skip_all, fields(ticket = %ticket.id, department = %ticket.department))]
    pub async fn assign(&self, ticket: &Ticket) -> Res<Option<String>> {
        if self.strategy == AssignmentStrategy::PriorityEscalation && ticket.priority.is_escalated() {
            if let Some(admin) = self.first_admin(&ticket.department).await? {
                info!("Escalating {} ticket to department admin `{admin}`.", ticket.priority);
                return Ok(Some(admin));
            }
        }

        let agents = self.store.list_staff(&ticket.department, StaffRole::SupportAgent).await?;

        if agents.is_empty() {
            let admin = self.first_admin(&ticket.department).await?;

            match &admin {
                Some(admin) => info!("No support agents; assigning to department admin `{admin}`."),
                None => info!("No eligible staff; leaving ticket unassigned."),
            }

            return Ok(admin);
        }

        let selected = match self.strategy {
            AssignmentStrategy::RoundRobin => {
                let cursor = self.store.next_round_robin_cursor(&ticket.department).await?;
                let index = (cursor % agents.len() as u64) as usize;

                Some(agents[index].staff_id.clone())
            }
            AssignmentStrategy::Workload | AssignmentStrategy::PriorityEscalation => {
                let staff_ids = agents.iter().map(|agent| agent.staff_id.clone()).collect::<Vec<_>>();
                let mut workloads = self.store.open_workloads(&staff_ids).await?;

                // The ticket itself does not weigh against its current owner.
                if ticket.status.counts_toward_workload()
                    && let Some(owner) = &ticket.assigned_to
                    && let Some(count) = workloads.get_mut(owner)
                {
                    *count = count.saturating_sub(1);
                }

                select_agent(&agents, &workloads)
            }
        };

        if let Some(agent) = &selected {
            info!("Selected agent `{agent}` out of {} candidates.", agents.len());
        }

        Ok(selected)
    }

    /// Decide and persist the owner of `ticket`.
    #[instrument(skip_all, fields(ticket = %ticket.id))]
    pub async fn assign_and_record(&self, ticket: &Ticket) -> Res<Option<String>> {
        let assignee = self.assign(ticket).await?;

        if assignee.is_some() {
            self.store.set_ticket_assignee(&ticket.id, assignee.as_deref()).await?;
        }

        Ok(assignee)
    }

    async fn first_admin(&self, department: &str) -> Res<Option<String>> {
        let admins = self.store.list_staff(department, StaffRole::DepartmentAdmin).await?;

        Ok(admins.into_iter().next().map(|admin| admin.staff_id))
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::base::types::{Priority, TicketStatus};

    const RV: &str = "Residential Village (RV)";

    fn agent(staff_id: &str, is_primary: bool) -> StaffAssignment {
        staff(staff_id, StaffRole::SupportAgent, is_primary)
    }

    fn staff(staff_id: &str, role: StaffRole, is_primary: bool) -> StaffAssignment {
        StaffAssignment {
            staff_id: staff_id.to_string(),
            department: RV.to_string(),
            role,
            is_primary,
        }
    }

    fn ticket(id: &str, priority: Priority, status: TicketStatus, assigned_to: Option<&str>) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: "Aircon".to_string(),
            description: String::new(),
            department: RV.to_string(),
            priority,
            category: "Accommodation".to_string(),
            status,
            assigned_to: assigned_to.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    fn workloads(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(id, count)| (id.to_string(), *count)).collect()
    }

    async fn store_with(staff: &[StaffAssignment], tickets: &[Ticket]) -> StoreClient {
        let store = StoreClient::memory();

        for assignment in staff {
            store.add_staff_assignment(assignment).await.unwrap();
        }

        for ticket in tickets {
            store.create_ticket(ticket).await.unwrap();
        }

        store
    }

    #[test]
    fn primary_beats_lower_workload() {
        let agents = vec![agent("a", false), agent("b", true)];

        assert_eq!(select_agent(&agents, &workloads(&[("a", 1), ("b", 3)])), Some("b".to_string()));
    }

    #[test]
    fn primary_wins_ties_regardless_of_order() {
        let loads = workloads(&[("a", 2), ("b", 2)]);

        assert_eq!(select_agent(&[agent("a", false), agent("b", true)], &loads), Some("b".to_string()));
        assert_eq!(select_agent(&[agent("b", true), agent("a", false)], &loads), Some("b".to_string()));
    }

    #[test]
    fn least_loaded_wins_among_equals() {
        let agents = vec![agent("a", false), agent("b", false), agent("c", false)];

        assert_eq!(select_agent(&agents, &workloads(&[("a", 4), ("b", 0), ("c", 2)])), Some("b".to_string()));
    }

    #[test]
    fn full_ties_keep_listing_order() {
        let agents = vec![agent("x", true), agent("y", true), agent("z", false)];
        let ranked = rank_agents(&agents, &HashMap::new()).into_iter().map(|a| a.staff_id.as_str()).collect::<Vec<_>>();

        assert_eq!(ranked, vec!["x", "y", "z"]);
    }

    #[test]
    fn selection_is_deterministic() {
        let agents = vec![agent("a", false), agent("b", false), agent("c", true), agent("d", true)];
        let loads = workloads(&[("a", 0), ("c", 5), ("d", 5)]);

        let first = select_agent(&agents, &loads);

        for _ in 0..10 {
            assert_eq!(select_agent(&agents, &loads), first);
        }
        assert_eq!(first, Some("c".to_string()));
    }

    #[test]
    fn no_agents_selects_nobody() {
        assert_eq!(select_agent(&[], &HashMap::new()), None);
    }

    #[tokio::test]
    async fn empty_department_is_unassigned() {
        let store = store_with(&[], &[]).await;
        let assigner = AutoAssigner::new(store, AssignmentStrategy::Workload);

        let result = assigner.assign(&ticket("t1", Priority::Medium, TicketStatus::Open, None)).await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn admin_is_used_when_there_are_no_agents() {
        let store = store_with(&[staff("boss", StaffRole::DepartmentAdmin, false), staff("deputy", StaffRole::DepartmentAdmin, true)], &[]).await;
        let assigner = AutoAssigner::new(store, AssignmentStrategy::Workload);

        let result = assigner.assign(&ticket("t1", Priority::Low, TicketStatus::Open, None)).await.unwrap();

        assert_eq!(result, Some("boss".to_string()));
    }

    #[tokio::test]
    async fn workload_ignores_closed_tickets() {
        let tickets = [
            ticket("t1", Priority::Medium, TicketStatus::Open, Some("a")),
            ticket("t2", Priority::Medium, TicketStatus::Resolved, Some("b")),
            ticket("t3", Priority::Medium, TicketStatus::Closed, Some("b")),
            ticket("t4", Priority::Medium, TicketStatus::Escalated, Some("b")),
        ];
        let store = store_with(&[agent("a", false), agent("b", false)], &tickets).await;
        let assigner = AutoAssigner::new(store, AssignmentStrategy::Workload);

        let result = assigner.assign(&ticket("t5", Priority::Medium, TicketStatus::Open, None)).await.unwrap();

        assert_eq!(result, Some("b".to_string()));
    }

    #[tokio::test]
    async fn escalation_prefers_admin_for_urgent_tickets() {
        let store = store_with(&[agent("a", true), staff("boss", StaffRole::DepartmentAdmin, false)], &[]).await;
        let assigner = AutoAssigner::new(store, AssignmentStrategy::PriorityEscalation);

        let urgent = assigner.assign(&ticket("t1", Priority::Urgent, TicketStatus::Open, None)).await.unwrap();
        let high = assigner.assign(&ticket("t2", Priority::High, TicketStatus::Open, None)).await.unwrap();
        let medium = assigner.assign(&ticket("t3", Priority::Medium, TicketStatus::Open, None)).await.unwrap();

        assert_eq!(urgent, Some("boss".to_string()));
        assert_eq!(high, Some("boss".to_string()));
        assert_eq!(medium, Some("a".to_string()));
    }

    #[tokio::test]
    async fn escalation_without_admin_uses_agents() {
        let store = store_with(&[agent("a", false)], &[]).await;
        let assigner = AutoAssigner::new(store, AssignmentStrategy::PriorityEscalation);

        let result = assigner.assign(&ticket("t1", Priority::Urgent, TicketStatus::Open, None)).await.unwrap();

        assert_eq!(result, Some("a".to_string()));
    }

    #[tokio::test]
    async fn workload_strategy_ignores_priority() {
        let store = store_with(&[agent("a", false), staff("boss", StaffRole::DepartmentAdmin, false)], &[]).await;
        let assigner = AutoAssigner::new(store, AssignmentStrategy::Workload);

        let result = assigner.assign(&ticket("t1", Priority::Urgent, TicketStatus::Open, None)).await.unwrap();

        assert_eq!(result, Some("a".to_string()));
    }

    #[tokio::test]
    async fn round_robin_cycles_through_agents() {
        let store = store_with(&[agent("a", false), agent("b", true), agent("c", false)], &[]).await;
        let assigner = AutoAssigner::new(store, AssignmentStrategy::RoundRobin);

        let mut picks = Vec::new();
        for i in 0..4 {
            let t = ticket(&format!("t{i}"), Priority::Medium, TicketStatus::Open, None);
            picks.push(assigner.assign(&t).await.unwrap().unwrap());
        }

        assert_eq!(picks, vec!["a", "b", "c", "a"]);
    }

    #[tokio::test]
    async fn reassignment_keeps_the_current_owner_on_equal_load() {
        let store = store_with(&[agent("a", false), agent("b", false)], &[ticket("t1", Priority::Medium, TicketStatus::Open, None)]).await;
        let assigner = AutoAssigner::new(store.clone(), AssignmentStrategy::Workload);

        let mut picks = Vec::new();
        for _ in 0..3 {
            let t1 = store.get_ticket("t1").await.unwrap().unwrap();
            picks.push(assigner.assign_and_record(&t1).await.unwrap().unwrap());
        }

        assert_eq!(picks, vec!["a", "a", "a"]);
    }

    #[tokio::test]
    async fn reassignment_moves_away_from_a_busier_owner() {
        let store = store_with(&[agent("a", false), agent("b", false)], &[ticket("t1", Priority::Medium, TicketStatus::Open, Some("a"))]).await;
        let assigner = AutoAssigner::new(store.clone(), AssignmentStrategy::Workload);

        let t1 = store.get_ticket("t1").await.unwrap().unwrap();
        assert_eq!(assigner.assign(&t1).await.unwrap(), Some("a".to_string()));

        store.create_ticket(&ticket("t2", Priority::Medium, TicketStatus::Open, Some("a"))).await.unwrap();
        assert_eq!(assigner.assign(&t1).await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn assign_and_record_persists_the_assignee() {
        let store = store_with(&[agent("a", false)], &[ticket("t1", Priority::Medium, TicketStatus::Open, None)]).await;
        let assigner = AutoAssigner::new(store.clone(), AssignmentStrategy::Workload);

        let t1 = store.get_ticket("t1").await.unwrap().unwrap();
        let assignee = assigner.assign_and_record(&t1).await.unwrap();

        assert_eq!(assignee, Some("a".to_string()));
        assert_eq!(store.get_ticket("t1").await.unwrap().unwrap().assigned_to, Some("a".to_string()));
    }
}
