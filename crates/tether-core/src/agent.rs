//! Agent capability

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::tool::Tool;

/// Who an agent is and what it is for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Text,
    Done,
}

/// An event emitted by [`Agent::stream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEvent {
    pub kind: EventKind,
    pub text: String,
    pub agent_id: String,
}

impl AgentEvent {
    pub fn text(agent_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Text,
            text: text.into(),
            agent_id: agent_id.into(),
        }
    }

    pub fn done(agent_id: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Done,
            text: String::new(),
            agent_id: agent_id.into(),
        }
    }
}

pub type EventStream<'a> = BoxStream<'a, Result<AgentEvent>>;

/// An agent that turns an input prompt into an output.
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &str;
    fn persona(&self) -> Persona;

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        Vec::new()
    }

    fn children(&self) -> Vec<Arc<dyn Agent>> {
        Vec::new()
    }

    /// Run the agent to completion. Implementations should return an error
    /// once `ctx` is cancelled.
    async fn invoke(&self, ctx: CancellationToken, input: &str) -> Result<String>;

    /// Event-sequence form of [`Agent::invoke`].
    ///
    /// The default runs `invoke` to completion and then yields one text event
    /// followed by a done event, or the single error.
    fn stream<'a>(&'a self, ctx: CancellationToken, input: &'a str) -> EventStream<'a> {
        let agent_id = self.id().to_string();
        stream::once(self.invoke(ctx, input))
            .flat_map(move |result| {
                let events = match result {
                    Ok(text) => vec![
                        Ok(AgentEvent::text(agent_id.as_str(), text)),
                        Ok(AgentEvent::done(agent_id.as_str())),
                    ],
                    Err(e) => vec![Err(e)],
                };
                stream::iter(events)
            })
            .boxed()
    }
}
