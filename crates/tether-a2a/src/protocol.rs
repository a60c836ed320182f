//! A2A (Agent-to-Agent) protocol types
//!
//! The agent card advertised at `/.well-known/agent.json` and the task
//! documents exchanged on `/tasks`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use tether_core::Agent;

/// Where a server publishes its agent card
pub const CARD_PATH: &str = "/.well-known/agent.json";

/// Agent Card: advertises identity and skills at [`CARD_PATH`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AgentCard {
    /// Describe `agent` as served from `endpoint`.
    ///
    /// The agent itself is the first skill, followed by one skill per tool, so
    /// callers can tell "delegate to the whole agent" apart from its tools.
    pub fn from_agent(agent: &dyn Agent, endpoint: impl Into<String>) -> Self {
        let persona = agent.persona();
        let description = if persona.goal.is_empty() {
            persona.role.clone()
        } else {
            persona.goal.clone()
        };

        let mut skills = vec![AgentSkill {
            name: agent.id().to_string(),
            description: description.clone(),
        }];
        skills.extend(agent.tools().iter().map(|tool| AgentSkill {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
        }));

        Self {
            name: agent.id().to_string(),
            description,
            version: String::new(),
            capabilities: vec!["text".to_string()],
            endpoint: endpoint.into(),
            skills,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Task lifecycle status
///
/// `submitted → working → {completed | failed | canceled}`; a submitted task
/// may also be canceled before it starts. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Submitted,
    Working,
    Completed,
    Failed,
    Canceled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match self {
            Self::Submitted => matches!(next, Self::Working | Self::Canceled),
            Self::Working => matches!(next, Self::Completed | Self::Failed | Self::Canceled),
            Self::Completed | Self::Failed | Self::Canceled => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Working => write!(f, "working"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// A unit of delegated work. The server that created it owns the canonical copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub input: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A fresh `submitted` task with a random id
    pub fn new(input: impl Into<String>, metadata: Option<Map<String, Value>>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            status: TaskStatus::Submitted,
            input: input.into(),
            output: String::new(),
            error: String::new(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next` if the lifecycle allows it. Returns whether it moved.
    pub fn advance(&mut self, next: TaskStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }

    pub fn complete(&mut self, output: impl Into<String>) -> bool {
        let moved = self.advance(TaskStatus::Completed);
        if moved {
            self.output = output.into();
        }
        moved
    }

    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        let moved = self.advance(TaskStatus::Failed);
        if moved {
            self.error = error.into();
        }
        moved
    }

    pub fn mark_canceled(&mut self) -> bool {
        self.advance(TaskStatus::Canceled)
    }
}

/// Task submission request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl TaskRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Body of every successful task endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
}

/// Error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
