//! Config file: locate, parse, and validate `config.toml`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use tether_a2a::{PeerAgent, PollConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub a2a: A2aConfig,
}

/// `[mcp]`: the tool server and the remote servers to discover from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    #[serde(default = "default_mcp_bind")]
    pub bind: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cancel a served tool's context after this long; unset means no deadline
    #[serde(default)]
    pub call_timeout_secs: Option<u64>,
    #[serde(default)]
    pub servers: Vec<McpServerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpServerConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `[a2a]`: the delegation server and known peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct A2aConfig {
    #[serde(default = "default_a2a_bind")]
    pub bind: String,
    /// Advertised in the agent card
    #[serde(default = "default_a2a_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_poll_initial_ms")]
    pub poll_initial_ms: u64,
    #[serde(default = "default_poll_max_ms")]
    pub poll_max_ms: u64,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    pub name: String,
    pub url: String,
}

fn default_mcp_bind() -> String {
    "127.0.0.1:8090".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_a2a_bind() -> String {
    "127.0.0.1:8091".to_string()
}
fn default_a2a_endpoint() -> String {
    "http://127.0.0.1:8091".to_string()
}
fn default_poll_initial_ms() -> u64 {
    100
}
fn default_poll_max_ms() -> u64 {
    5000
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            bind: default_mcp_bind(),
            timeout_secs: default_timeout_secs(),
            call_timeout_secs: None,
            servers: Vec::new(),
        }
    }
}

impl Default for A2aConfig {
    fn default() -> Self {
        Self {
            bind: default_a2a_bind(),
            endpoint: default_a2a_endpoint(),
            poll_initial_ms: default_poll_initial_ms(),
            poll_max_ms: default_poll_max_ms(),
            peers: Vec::new(),
        }
    }
}

impl McpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }
}

impl A2aConfig {
    pub fn poll(&self) -> PollConfig {
        PollConfig {
            initial: Duration::from_millis(self.poll_initial_ms),
            max: Duration::from_millis(self.poll_max_ms),
        }
    }

    pub fn peer_agents(&self) -> Vec<PeerAgent> {
        self.peers
            .iter()
            .map(|p| PeerAgent {
                name: p.name.clone(),
                url: p.url.clone(),
            })
            .collect()
    }
}

// ── Loading ─────────────────────────────────────────────────────

/// `~/.tether`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tether")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl Config {
    /// Parse and validate a config document
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load from an explicit path, else the default location. Only a missing
    /// default file falls back to defaults.
    ///
    /// `$TETHER_CONFIG` arrives here as the explicit path through `--config`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let path = default_config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.mcp.timeout_secs == 0 {
            bail!("mcp.timeout_secs must be greater than 0");
        }
        if self.mcp.call_timeout_secs == Some(0) {
            bail!("mcp.call_timeout_secs must be greater than 0");
        }

        let mut names = HashSet::new();
        for server in &self.mcp.servers {
            if server.name.trim().is_empty() {
                bail!("mcp.servers: server name must not be empty");
            }
            if !names.insert(server.name.as_str()) {
                bail!("mcp.servers: duplicate server name '{}'", server.name);
            }
            check_http_url(&server.endpoint)
                .with_context(|| format!("mcp.servers '{}': invalid endpoint", server.name))?;
        }

        check_http_url(&self.a2a.endpoint).context("a2a.endpoint is invalid")?;
        if self.a2a.poll_initial_ms == 0 {
            bail!("a2a.poll_initial_ms must be greater than 0");
        }
        if self.a2a.poll_max_ms < self.a2a.poll_initial_ms {
            bail!(
                "a2a.poll_max_ms ({}) must be at least a2a.poll_initial_ms ({})",
                self.a2a.poll_max_ms,
                self.a2a.poll_initial_ms
            );
        }

        let mut names = HashSet::new();
        for peer in &self.a2a.peers {
            if peer.name.trim().is_empty() {
                bail!("a2a.peers: peer name must not be empty");
            }
            if !names.insert(peer.name.as_str()) {
                bail!("a2a.peers: duplicate peer name '{}'", peer.name);
            }
            check_http_url(&peer.url)
                .with_context(|| format!("a2a.peers '{}': invalid url", peer.name))?;
        }

        Ok(())
    }
}

fn check_http_url(raw: &str) -> Result<()> {
    let url = url::Url::parse(raw).with_context(|| format!("'{}' is not a URL", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("'{}' uses unsupported scheme '{}'", raw, other),
    }
}
