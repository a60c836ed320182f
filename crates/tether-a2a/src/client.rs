//! A2A client: drives a peer agent's task lifecycle

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::A2aError;
use crate::protocol::*;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A2A client bound to one peer agent
#[derive(Clone)]
pub struct A2aClient {
    http: Client,
    base_url: String,
}

impl A2aClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the agent's capability card
    pub async fn get_card(&self) -> Result<AgentCard, A2aError> {
        let url = format!("{}{}", self.base_url, CARD_PATH);
        debug!("Fetching agent card from {}", url);

        let card: AgentCard = self
            .send("get_card", self.http.get(&url), &url, StatusCode::OK)
            .await?;

        info!(
            "Fetched agent card: {} ({} skills)",
            card.name,
            card.skills.len()
        );
        Ok(card)
    }

    /// Submit a task to the agent
    pub async fn create_task(&self, request: &TaskRequest) -> Result<Task, A2aError> {
        let url = format!("{}/tasks", self.base_url);
        debug!("Submitting task to {}", url);

        let response: TaskResponse = self
            .send(
                "create_task",
                self.http.post(&url).json(request),
                &url,
                StatusCode::CREATED,
            )
            .await?;

        info!(
            "Task submitted: {} (status: {})",
            response.task.id, response.task.status
        );
        Ok(response.task)
    }

    /// Fetch the current snapshot of a task
    pub async fn get_task(&self, id: &str) -> Result<Task, A2aError> {
        let url = format!("{}/tasks/{}", self.base_url, id);
        let response: TaskResponse = self
            .send("get_task", self.http.get(&url), &url, StatusCode::OK)
            .await
            .map_err(|e| not_found(e, id))?;
        Ok(response.task)
    }

    /// Ask the agent to cancel a task. Canceling a finished task succeeds and
    /// changes nothing.
    pub async fn cancel_task(&self, id: &str) -> Result<Task, A2aError> {
        let url = format!("{}/tasks/{}/cancel", self.base_url, id);
        let response: TaskResponse = self
            .send("cancel_task", self.http.post(&url), &url, StatusCode::OK)
            .await
            .map_err(|e| not_found(e, id))?;

        info!("Task {} cancel requested (status: {})", id, response.task.status);
        Ok(response.task)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: RequestBuilder,
        url: &str,
        expected: StatusCode,
    ) -> Result<T, A2aError> {
        let resp = request.send().await.map_err(|e| A2aError::Transport {
            op,
            url: url.to_string(),
            source: e,
        })?;
        read(op, resp, expected).await
    }
}

async fn read<T: DeserializeOwned>(
    op: &'static str,
    resp: Response,
    expected: StatusCode,
) -> Result<T, A2aError> {
    let status = resp.status();
    if status != expected {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(A2aError::Status {
            op,
            status,
            message,
        });
    }

    let body = resp.bytes().await.map_err(|e| A2aError::Decode {
        op,
        message: e.to_string(),
    })?;
    serde_json::from_slice(&body).map_err(|e| A2aError::Decode {
        op,
        message: e.to_string(),
    })
}

fn not_found(err: A2aError, id: &str) -> A2aError {
    match err {
        A2aError::Status {
            status: StatusCode::NOT_FOUND,
            ..
        } => A2aError::NotFound(id.to_string()),
        other => other,
    }
}
