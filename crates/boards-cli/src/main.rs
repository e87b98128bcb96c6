//! Boards CLI - Azure Boards tools for AI assistants.

use std::sync::Arc;

use anyhow::Context;
use boards_azure::AzureDevOpsClient;
use boards_core::config::{Config, ORG_URL_ENV, TOKEN_ENV};
use boards_mcp::handlers::{
    FETCH_URL, GET_COMMENT, GET_WORK_ITEM, LIST_ATTACHMENTS, LIST_COMMENTS, LIST_MY_WORK_ITEMS,
};
use boards_mcp::protocol::{ToolCallResult, ToolResultContent};
use boards_mcp::{McpServer, ToolHandler};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boards")]
#[command(author, version, about = "Azure Boards tools for AI assistants", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Azure DevOps organization URL
    #[arg(long, global = true, env = ORG_URL_ENV)]
    org_url: Option<String>,

    /// Azure DevOps personal access token
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio
    Serve,

    /// Show a work item
    WorkItem {
        /// Work item ID
        id: u64,
    },

    /// List active work items assigned to you
    MyWorkItems,

    /// List the attachments of a work item as JSON
    Attachments {
        /// Work item ID
        id: u64,
    },

    /// List the most recent comments of a work item
    Comments {
        /// Work item ID
        ticket: u64,

        /// Maximum number of comments
        #[arg(short, long, default_value = "100")]
        limit: u32,
    },

    /// Show a single comment of a work item
    Comment {
        /// Work item ID
        ticket: u64,

        /// Comment ID
        comment_id: u64,
    },

    /// Download a URL with Azure DevOps credentials
    Fetch {
        /// URL to fetch
        url: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Key path (e.g., azure_devops.organization_url)
        key: String,

        /// Value to store
        value: String,
    },

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr: stdout carries the MCP protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("Boards - Azure Boards tools for AI assistants");
        println!("Run with --help for usage information");
        return Ok(());
    };

    let (tool, arguments) = match command {
        Commands::Config { command } => return run_config(command),
        Commands::Serve => {
            let client = connect(cli.org_url, cli.token)?;
            let mut server = McpServer::new(Arc::new(client));
            server.run().await?;
            return Ok(());
        }
        Commands::WorkItem { id } => (GET_WORK_ITEM, json!({ "id": id })),
        Commands::MyWorkItems => (LIST_MY_WORK_ITEMS, json!({})),
        Commands::Attachments { id } => (LIST_ATTACHMENTS, json!({ "id": id })),
        Commands::Comments { ticket, limit } => {
            (LIST_COMMENTS, json!({ "ticket": ticket, "limit": limit }))
        }
        Commands::Comment { ticket, comment_id } => (
            GET_COMMENT,
            json!({ "ticket": ticket, "comment_id": comment_id }),
        ),
        Commands::Fetch { url, name } => (FETCH_URL, json!({ "url": url, "name": name })),
    };

    let client = connect(cli.org_url, cli.token)?;
    let handler = ToolHandler::new(Arc::new(client));
    let result = handler.execute(tool, Some(arguments)).await;
    print_result(&result);

    if result.is_error == Some(true) {
        std::process::exit(1);
    }
    Ok(())
}

/// Build the Azure DevOps client from flags (or their env vars) and the config file.
fn connect(org_url: Option<String>, token: Option<String>) -> anyhow::Result<AzureDevOpsClient> {
    let config = Config::load().context("Failed to load config")?;
    let credentials = config.credentials_with(|key| match key {
        ORG_URL_ENV => org_url.clone(),
        TOKEN_ENV => token.clone(),
        _ => None,
    })?;

    tracing::debug!(org = %credentials.organization_url, "Connecting to Azure DevOps");
    Ok(AzureDevOpsClient::new(
        credentials.organization_url,
        credentials.token,
    )?)
}

fn run_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load()?;
            println!("Config file: {}", Config::config_path()?.display());
            match config.get("azure_devops.organization_url")? {
                Some(url) => println!("azure_devops.organization_url = {}", url),
                None => println!("azure_devops.organization_url is not set"),
            }
            let token_state = if std::env::var(TOKEN_ENV).is_ok_and(|t| !t.is_empty()) {
                "set"
            } else {
                "not set"
            };
            println!("{}: {}", TOKEN_ENV, token_state);
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("{} updated", key);
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

fn print_result(result: &ToolCallResult) {
    for content in &result.content {
        match content {
            ToolResultContent::Text { text, .. } => {
                if result.is_error == Some(true) {
                    eprintln!("{}", text);
                } else {
                    println!("{}", text);
                }
            }
            ToolResultContent::Image {
                data,
                mime_type,
                name,
            } => {
                println!(
                    "Image {} ({}, {} base64 chars)",
                    name.as_deref().unwrap_or("<unnamed>"),
                    mime_type,
                    data.len()
                );
            }
            ToolResultContent::Resource { resource, name } => {
                println!(
                    "Resource {} ({}, {} base64 chars) from {}",
                    name.as_deref().unwrap_or("<unnamed>"),
                    resource.mime_type,
                    resource.blob.len(),
                    resource.uri
                );
            }
        }
    }
}
