//! A2A (Agent-to-Agent) delegation support for tether
//!
//! Provides a server that exposes a local agent as an agent card plus a task
//! lifecycle over HTTP, a client that drives that lifecycle, and a
//! `RemoteAgent` that makes a peer look like any other local agent.

pub mod client;
pub mod error;
pub mod protocol;
pub mod remote;
pub mod server;
pub mod tool;

pub use client::A2aClient;
pub use error::{A2aError, ServerError};
pub use protocol::{
    AgentCard, AgentSkill, ErrorResponse, Task, TaskRequest, TaskResponse, TaskStatus,
};
pub use remote::{Backoff, MIN_POLL_DELAY, PollConfig, RemoteAgent};
pub use server::A2aServer;
pub use tool::{DelegateToAgentTool, PeerAgent};
