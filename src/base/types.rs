use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Classification.

/// Priority tier of a ticket.
///
/// The derived ordering runs from least to most urgent, so `Priority::Urgent` is the maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Whether a ticket of this priority should go to a department admin first.
    pub fn is_escalated(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Err;

    fn from_str(s: &str) -> Res<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(anyhow::anyhow!("Invalid priority: {s}. Must be one of: low, medium, high, urgent")),
        }
    }
}

/// Where a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Local,
    Ai,
}

/// Free text submitted with a support request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ClassificationRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// True when neither field carries any text.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }
}

/// Routing decision for a support request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub department: String,
    pub priority: Priority,
    pub category: String,
    pub confidence: f64,
    pub source: ClassificationSource,
}

/// Raw classification as the model is asked to return it.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmClassification {
    pub department: String,
    pub priority: String,
    #[serde(default)]
    pub category: String,
    pub confidence: f64,
}

// Tickets and staff.

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Pending,
    Resolved,
    Closed,
    Escalated,
}

impl TicketStatus {
    /// Statuses that count toward a staff member's workload.
    pub const OPEN: [TicketStatus; 3] = [TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Escalated => "escalated",
        }
    }

    pub fn counts_toward_workload(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

/// A support ticket as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub department: String,
    pub priority: Priority,
    pub category: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role a staff member holds within a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    SupportAgent,
    DepartmentAdmin,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupportAgent => "support_agent",
            Self::DepartmentAdmin => "department_admin",
        }
    }
}

/// Links a staff member to a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAssignment {
    pub staff_id: String,
    pub department: String,
    pub role: StaffRole,
    #[serde(default)]
    pub is_primary: bool,
}

// Summaries.

/// One turn of a support conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Input accepted by the summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryRequest {
    Conversation {
        messages: Vec<ChatMessage>,
    },
    Ticket {
        #[serde(default)]
        title: Option<String>,
        description: String,
    },
}

// LLM contexts.

/// Everything the model sees when classifying a ticket.
#[derive(Debug, Clone)]
pub struct ClassificationContext {
    pub title: String,
    pub description: String,
    /// Canonical department names, in catalog order.
    pub department_names: Vec<String>,
    /// One line per department: name and description.
    pub department_listing: String,
}

/// Everything the model sees when summarizing.
#[derive(Debug, Clone)]
pub struct SummaryContext {
    pub content: String,
}
