//! Remote A2A agents as local `Agent`s
//!
//! `RemoteAgent::invoke` submits a task and polls until it finishes, backing
//! off exponentially between polls. `stream` is the trait default: the same
//! blocking call followed by one text event and one done event, since the
//! wire protocol has no partial results.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tether_core::{Agent, Persona};

use crate::client::A2aClient;
use crate::error::A2aError;
use crate::protocol::{AgentCard, Task, TaskRequest, TaskStatus};

/// Poll schedule for waiting on a remote task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(5),
        }
    }
}

/// Shortest delay a [`Backoff`] will ever yield
pub const MIN_POLL_DELAY: Duration = Duration::from_millis(1);

/// Exponential backoff: starts at `initial`, doubles after every delay and
/// stays at `max` once it gets there. Never ends.
///
/// Both bounds are raised to [`MIN_POLL_DELAY`], so a zero config still
/// sleeps between polls.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(config: PollConfig) -> Self {
        let max = config.max.max(MIN_POLL_DELAY);
        Self {
            next: config.initial.max(MIN_POLL_DELAY).min(max),
            max,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

/// A peer agent reached over A2A.
///
/// The card is fetched once at connect time and never refreshed.
pub struct RemoteAgent {
    client: A2aClient,
    card: AgentCard,
    poll: PollConfig,
}

impl RemoteAgent {
    /// Fetch the card at `url` and wrap the peer
    pub async fn connect(url: &str) -> Result<Self, A2aError> {
        Self::connect_with(A2aClient::new(url), PollConfig::default()).await
    }

    pub async fn connect_with(client: A2aClient, poll: PollConfig) -> Result<Self, A2aError> {
        let card = client.get_card().await?;
        Ok(Self::from_card(client, card).with_poll(poll))
    }

    /// Wrap a peer whose card is already known
    pub fn from_card(client: A2aClient, card: AgentCard) -> Self {
        Self {
            client,
            card,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    pub fn client(&self) -> &A2aClient {
        &self.client
    }

    /// Submit `request` and wait for the task to finish.
    ///
    /// Cancelling `ctx` stops the wait at once but leaves the remote task
    /// running; use [`A2aClient::cancel_task`] to stop it.
    pub async fn run(&self, ctx: CancellationToken, request: &TaskRequest) -> Result<String, A2aError> {
        let task = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(A2aError::PollingCanceled),
            task = self.client.create_task(request) => task?,
        };
        let id = task.id.clone();
        if let Some(result) = finished(task) {
            return result;
        }

        let mut backoff = Backoff::new(self.poll);
        loop {
            let delay = backoff.next_delay();
            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(A2aError::PollingCanceled),
                _ = tokio::time::sleep(delay) => {}
            }

            let task = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(A2aError::PollingCanceled),
                task = self.client.get_task(&id) => task?,
            };
            debug!("A2A task {} at {} is {}", id, self.card.name, task.status);

            if let Some(result) = finished(task) {
                return result;
            }
        }
    }
}

/// The outcome of a task, or `None` while it is still in flight
fn finished(task: Task) -> Option<Result<String, A2aError>> {
    match task.status {
        TaskStatus::Completed => Some(Ok(task.output)),
        TaskStatus::Failed => Some(Err(A2aError::TaskFailed(task.error))),
        TaskStatus::Canceled => Some(Err(A2aError::TaskCanceled)),
        TaskStatus::Submitted | TaskStatus::Working => None,
    }
}

#[async_trait]
impl Agent for RemoteAgent {
    fn id(&self) -> &str {
        &self.card.name
    }

    fn persona(&self) -> Persona {
        Persona {
            role: self.card.name.clone(),
            goal: self.card.description.clone(),
            backstory: String::new(),
        }
    }

    async fn invoke(&self, ctx: CancellationToken, input: &str) -> anyhow::Result<String> {
        Ok(self.run(ctx, &TaskRequest::new(input)).await?)
    }
}
