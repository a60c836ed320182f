//! tether: serve tools and agents, discover remote tools, delegate tasks
//!
//! Usage:
//!   tether serve
//!   tether discover --tag local
//!   tether call echo --args '{"text":"hi"}'
//!   tether card http://127.0.0.1:8091
//!   tether delegate http://127.0.0.1:8091 "summarize this"

mod config;
mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tether_a2a::{A2aClient, A2aServer, AgentCard, DelegateToAgentTool, RemoteAgent};
use tether_core::Agent;
use tether_mcp::{McpRegistry, McpServer};

use config::Config;
use demo::{EchoAgent, EchoTool};

#[derive(Debug, Parser)]
#[command(name = "tether", version, about = "Tool and agent interoperability over HTTP")]
struct Cli {
    /// Config file (default: ~/.tether/config.toml)
    #[arg(long, global = true, env = "TETHER_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the tool server and the delegation server until Ctrl-C
    Serve,
    /// List tools from every configured MCP server
    Discover {
        /// Only query servers carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Call a tool discovered from the configured MCP servers
    Call {
        tool: String,
        /// Only look for the tool on this server
        #[arg(long)]
        server: Option<String>,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Print a peer agent's card
    Card { url: String },
    /// Send a task to a peer agent and wait for the result
    Delegate { url: String, input: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => serve(&config).await,
        Command::Discover { tag } => discover(&config, tag.as_deref()).await,
        Command::Call { tool, server, args } => {
            call(&config, &tool, server.as_deref(), &args).await
        }
        Command::Card { url } => card(&url).await,
        Command::Delegate { url, input } => delegate(&config, &url, &input).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// A token cancelled on the first Ctrl-C
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
        }
        trigger.cancel();
    });
    token
}

/// A registry holding every configured MCP server
async fn registry(config: &Config) -> McpRegistry {
    let registry = McpRegistry::with_timeout(config.mcp.timeout());
    for server in &config.mcp.servers {
        registry
            .add_server(&server.name, &server.endpoint, server.tags.iter().cloned())
            .await;
    }
    registry
}

async fn serve(config: &Config) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    let mut tools = McpServer::new("tether", version);
    if let Some(limit) = config.mcp.call_timeout() {
        tools = tools.with_call_timeout(limit);
    }
    tools.add_tool(Arc::new(EchoTool)).await;
    if !config.a2a.peers.is_empty() {
        let delegate =
            DelegateToAgentTool::new(config.a2a.peer_agents()).with_poll(config.a2a.poll());
        tools.add_tool(Arc::new(delegate)).await;
        info!("delegate_to_agent enabled for {} peers", config.a2a.peers.len());
    }

    let agent: Arc<dyn Agent> = Arc::new(EchoAgent);
    let card = AgentCard::from_agent(agent.as_ref(), &config.a2a.endpoint).with_version(version);
    let agents = A2aServer::new(agent, card);

    let shutdown = ctrl_c_token();
    tokio::try_join!(
        async {
            tools
                .serve(&config.mcp.bind, shutdown.clone())
                .await
                .context("MCP server failed")
        },
        async {
            agents
                .serve(&config.a2a.bind, shutdown.clone())
                .await
                .context("A2A server failed")
        },
    )?;
    Ok(())
}

async fn discover(config: &Config, tag: Option<&str>) -> Result<()> {
    if config.mcp.servers.is_empty() {
        warn!("No MCP servers configured");
        return Ok(());
    }

    let registry = registry(config).await;

    let found = match tag {
        Some(tag) => registry.discover_tools_with_tag(tag).await?,
        None => registry.discover_tools().await?,
    };

    for discovered in &found {
        println!(
            "{}\t{}\t{}",
            discovered.server,
            discovered.tool.name(),
            discovered.tool.description()
        );
    }
    info!("{} tools discovered", found.len());
    Ok(())
}

async fn call(config: &Config, tool: &str, server: Option<&str>, args: &str) -> Result<()> {
    let input: Value = serde_json::from_str(args).context("--args must be valid JSON")?;
    if !input.is_object() {
        bail!("--args must be a JSON object");
    }

    let registry = registry(config).await;

    let found = match server {
        Some(name) => registry.discover_tools_from_server(name).await?,
        None => registry.discover_tools().await?,
    };
    let target = found
        .into_iter()
        .find(|d| d.tool.name() == tool)
        .with_context(|| format!("Tool '{}' not found on any configured server", tool))?;

    info!("Calling {} on {}", tool, target.server);
    let output = target.tool.execute(ctrl_c_token(), input).await?;

    println!("{}", output.text_content());
    if output.is_error {
        bail!("Tool '{}' reported an error", tool);
    }
    Ok(())
}

async fn card(url: &str) -> Result<()> {
    let card = A2aClient::new(url).get_card().await?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

async fn delegate(config: &Config, url: &str, input: &str) -> Result<()> {
    let remote = RemoteAgent::connect_with(A2aClient::new(url), config.a2a.poll())
        .await
        .with_context(|| format!("Failed to reach agent at {}", url))?;

    info!("Delegating to '{}'", remote.id());
    let output = remote.invoke(ctrl_c_token(), input).await?;
    println!("{}", output);
    Ok(())
}
