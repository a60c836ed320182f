//! Core capabilities for tether
//!
//! Defines the `Tool` and `Agent` interfaces that the protocol crates expose
//! over the network and produce from remote endpoints. Local implementations,
//! remote bridges and test doubles all satisfy the same traits.

pub mod agent;
pub mod tool;

pub use agent::{Agent, AgentEvent, EventKind, EventStream, Persona};
pub use tool::{ContentPart, Tool, ToolOutput, json_schema};
pub use tokio_util::sync::CancellationToken;
