//! A2A server: exposes a local agent to peers
//!
//! Serves the agent card and a task lifecycle. Each task runs the wrapped
//! agent on its own tokio task; handlers only ever read or advance the stored
//! copy under the lock, never across the agent call.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use tether_core::Agent;

use crate::error::{A2aError, ServerError};
use crate::protocol::*;

struct TaskEntry {
    task: Task,
    cancel: CancellationToken,
}

struct Inner {
    agent: Arc<dyn Agent>,
    card: AgentCard,
    tasks: RwLock<HashMap<String, TaskEntry>>,
}

/// Delegation server backed by one local agent.
///
/// Cloning is cheap; clones share the task table. Tasks live for as long as
/// the server does.
#[derive(Clone)]
pub struct A2aServer {
    inner: Arc<Inner>,
}

impl A2aServer {
    pub fn new(agent: Arc<dyn Agent>, card: AgentCard) -> Self {
        Self {
            inner: Arc::new(Inner {
                agent,
                card,
                tasks: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Build the card from the agent itself
    pub fn from_agent(agent: Arc<dyn Agent>, endpoint: impl Into<String>) -> Self {
        let card = AgentCard::from_agent(agent.as_ref(), endpoint);
        Self::new(agent, card)
    }

    pub fn card(&self) -> &AgentCard {
        &self.inner.card
    }

    /// Snapshot of a task
    pub async fn task(&self, id: &str) -> Option<Task> {
        let tasks = self.inner.tasks.read().await;
        tasks.get(id).map(|entry| entry.task.clone())
    }

    /// Store a new task and start running the agent on it.
    ///
    /// Returns the task as stored, before execution has started.
    pub async fn create_task(&self, request: TaskRequest) -> Result<Task, A2aError> {
        if request.input.is_empty() {
            return Err(A2aError::InvalidRequest("input is required".to_string()));
        }

        let task = Task::new(request.input, request.metadata);
        let cancel = CancellationToken::new();
        {
            let mut tasks = self.inner.tasks.write().await;
            tasks.insert(
                task.id.clone(),
                TaskEntry {
                    task: task.clone(),
                    cancel: cancel.clone(),
                },
            );
        }

        info!("A2A task {} submitted", task.id);

        let server = self.clone();
        let id = task.id.clone();
        let input = task.input.clone();
        tokio::spawn(async move { server.run_task(id, input, cancel).await });

        Ok(task)
    }

    /// Request cancellation of a task and return its current snapshot.
    ///
    /// Terminal tasks are left alone. A task that has not started yet is
    /// canceled on the spot; a running one is only signalled, and becomes
    /// `canceled` once the agent gives up.
    pub async fn cancel_task(&self, id: &str) -> Option<Task> {
        let mut tasks = self.inner.tasks.write().await;
        let entry = tasks.get_mut(id)?;

        match entry.task.status {
            TaskStatus::Submitted => {
                entry.task.mark_canceled();
                entry.cancel.cancel();
                info!("A2A task {} canceled before it started", id);
            }
            TaskStatus::Working => {
                entry.cancel.cancel();
                info!("A2A task {} cancellation requested", id);
            }
            status => debug!("A2A cancel of {} task {} ignored", status, id),
        }

        Some(entry.task.clone())
    }

    async fn run_task(self, id: String, input: String, cancel: CancellationToken) {
        {
            let mut tasks = self.inner.tasks.write().await;
            let Some(entry) = tasks.get_mut(&id) else {
                return;
            };
            if !entry.task.advance(TaskStatus::Working) {
                debug!("A2A task {} not started ({})", id, entry.task.status);
                return;
            }
        }

        debug!("A2A task {} working", id);

        let outcome = AssertUnwindSafe(self.inner.agent.invoke(cancel.clone(), &input))
            .catch_unwind()
            .await;

        let mut tasks = self.inner.tasks.write().await;
        let Some(entry) = tasks.get_mut(&id) else {
            return;
        };

        match outcome {
            Ok(Ok(output)) => {
                entry.task.complete(output);
                info!("A2A task {} completed", id);
            }
            Ok(Err(_)) if cancel.is_cancelled() => {
                entry.task.mark_canceled();
                info!("A2A task {} canceled", id);
            }
            Ok(Err(e)) => {
                warn!("A2A task {} failed: {}", id, e);
                entry.task.fail(e.to_string());
            }
            Err(_) => {
                warn!("A2A task {} panicked", id);
                entry.task.fail("agent panicked");
            }
        }
    }

    /// Build the axum router for the card and task endpoints
    pub fn router(&self) -> Router {
        Router::new()
            .route(CARD_PATH, get(handle_card))
            .route("/tasks", post(handle_create_task))
            .route("/tasks/", get(handle_missing_id))
            .route("/tasks/{id}", get(handle_get_task).fallback(handle_not_found))
            .route(
                "/tasks/{id}/cancel",
                post(handle_cancel_task).fallback(handle_not_found),
            )
            .with_state(self.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind `addr` and serve until `shutdown` is cancelled
    pub async fn serve(&self, addr: &str, shutdown: CancellationToken) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_string(),
                source: e,
            })?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` is cancelled
    pub async fn serve_listener(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("A2A server '{}' listening on http://{}", self.inner.card.name, addr);
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        info!("A2A server '{}' stopped", self.inner.card.name);
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn handle_card(State(server): State<A2aServer>) -> Json<AgentCard> {
    Json(server.inner.card.clone())
}

async fn handle_create_task(State(server): State<A2aServer>, body: Bytes) -> Response {
    let request: TaskRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {}", e));
        }
    };

    match server.create_task(request).await {
        Ok(task) => (StatusCode::CREATED, Json(TaskResponse { task })).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn handle_get_task(State(server): State<A2aServer>, Path(id): Path<String>) -> Response {
    match server.task(&id).await {
        Some(task) => Json(TaskResponse { task }).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("task not found: {}", id)),
    }
}

async fn handle_cancel_task(State(server): State<A2aServer>, Path(id): Path<String>) -> Response {
    match server.cancel_task(&id).await {
        Some(task) => Json(TaskResponse { task }).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("task not found: {}", id)),
    }
}

async fn handle_missing_id() -> Response {
    error_response(StatusCode::BAD_REQUEST, "task id is required")
}

async fn handle_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}
