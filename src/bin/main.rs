use std::sync::Arc;

use account_insights::config::{
    DEFAULT_DB_PORT, DEFAULT_REPORT_REPO_URL, DEFAULT_SLACK_API_URL,
};
use account_insights::{
    DatabaseConfig, PgStore, SlackClient, SlackConfig, ToolServer, UploadConfig,
    create_crm_server, create_slack_server, create_upload_server,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "account-insights")]
#[command(about = "MCP tool servers for CRM, Slack and report uploads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the CRM tools (getOpportunities, getSupportCases)
    Crm {
        #[arg(long, env = "DB_HOST", default_value = "localhost")]
        db_host: String,
        #[arg(long, env = "DB_PORT", default_value_t = DEFAULT_DB_PORT)]
        db_port: u16,
        #[arg(long, env = "DB_USER")]
        db_user: Option<String>,
        #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
        db_password: Option<String>,
        #[arg(long, env = "DB_NAME")]
        db_name: Option<String>,
        /// Serve MCP over HTTP on this address instead of stdio
        #[arg(long)]
        bind: Option<String>,
    },
    /// Serve the Slack tools (slack_list_channels, slack_post_message)
    Slack {
        #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,
        #[arg(long, env = "SLACK_API_URL", default_value = DEFAULT_SLACK_API_URL)]
        api_url: String,
        /// Serve MCP over HTTP on this address instead of stdio
        #[arg(long)]
        bind: Option<String>,
    },
    /// Serve the report upload tool (upload_report_pdf)
    Upload {
        #[arg(long, env = "REPORT_REPO_URL", default_value = DEFAULT_REPORT_REPO_URL)]
        base_url: String,
        /// Serve MCP over HTTP on this address instead of stdio
        #[arg(long)]
        bind: Option<String>,
    },
}

async fn serve(server: ToolServer, bind: Option<String>) -> Result<()> {
    match bind {
        Some(bind) => account_insights::server::start_mcp_http(server, &bind).await,
        None => account_insights::server::serve_stdio(server).await,
    }
}

/// `RUST_LOG` plus the crate's default directives.
fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("account_insights=info".parse()?)
        .add_directive("rmcp=warn".parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP stdio transport; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter()?)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crm {
            db_host,
            db_port,
            db_user,
            db_password,
            db_name,
            bind,
        } => {
            let db_config = DatabaseConfig::new(db_host, db_port, db_user, db_password, db_name)?;
            info!("Starting CRM tool server with {:?}", db_config);

            let store = Arc::new(PgStore::connect(&db_config).await?);
            let server = create_crm_server(store.clone())?;

            let result = serve(server, bind).await;
            store.close().await;
            result?;
        }
        Commands::Slack {
            token,
            api_url,
            bind,
        } => {
            let slack_config = SlackConfig::new(token, &api_url)?;
            info!("Starting Slack tool server with {:?}", slack_config);

            let client = Arc::new(SlackClient::new(&slack_config)?);
            let server = create_slack_server(client)?;
            serve(server, bind).await?;
        }
        Commands::Upload { base_url, bind } => {
            let upload_config = UploadConfig::new(&base_url)?;
            info!("Starting report upload tool server with base URL {}", upload_config.base_url);

            let server = create_upload_server(&upload_config)?;
            serve(server, bind).await?;
        }
    }

    Ok(())
}
