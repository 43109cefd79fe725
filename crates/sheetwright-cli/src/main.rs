use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_stream::StreamExt;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use sheetwright_agent::{CompletionRouter, Orchestrator, Provider, RoutingConfig, RunEvent};
use sheetwright_ai::{AnthropicClient, AnthropicConfig, OpenAiClient, OpenAiConfig};
use sheetwright_table::{GoogleSheetsClient, GoogleSheetsConfig};

fn parse_route(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((tool, model)) if !tool.is_empty() && !model.is_empty() => {
            Ok((tool.to_string(), model.to_string()))
        }
        _ => Err("expected tool=model, e.g. write_table=claude-3.5".to_string()),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sheetwright",
    about = "Natural-language task runner for Google Sheets",
    version
)]
/// Public struct `Cli` used across Sheetwright components.
struct Cli {
    #[arg(help = "Natural-language task to run against the sheet")]
    task: String,

    #[arg(
        long,
        env = "SHEETWRIGHT_SPREADSHEET_ID",
        help = "Google Sheets spreadsheet id to operate on"
    )]
    spreadsheet_id: String,

    #[arg(
        long,
        env = "SHEETWRIGHT_RANGE",
        default_value = "Sheet1",
        help = "A1-notation range holding the working table"
    )]
    range: String,

    #[arg(
        long,
        env = "SHEETWRIGHT_MODEL",
        default_value = "gpt-4o",
        help = "Default catalog model: gpt-4o, gpt-4-turbo, gpt-4, gpt-3.5, or claude-3.5"
    )]
    model: String,

    #[arg(
        long = "route",
        value_parser = parse_route,
        help = "Per-tool model override as tool=model; repeatable"
    )]
    routes: Vec<(String, String)>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_ORG", help = "Optional OpenAI organization id")]
    openai_organization: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_SHEETS_ACCESS_TOKEN",
        hide_env_values = true,
        help = "OAuth access token for the Sheets API"
    )]
    google_access_token: String,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn build_router(cli: &Cli) -> Result<CompletionRouter> {
    let mut routing = RoutingConfig::new(&cli.model)?;
    for (tool, model) in &cli.routes {
        routing.set_model(tool, model)?;
    }

    let mut router = CompletionRouter::new(routing);
    if let Some(api_key) = &cli.openai_api_key {
        let client = OpenAiClient::new(OpenAiConfig {
            api_key: api_key.clone(),
            organization: cli.openai_organization.clone(),
            ..OpenAiConfig::default()
        })
        .context("failed to build OpenAI client")?;
        router = router.with_client(Provider::OpenAi, Arc::new(client));
    }
    if let Some(api_key) = &cli.anthropic_api_key {
        let client = AnthropicClient::new(AnthropicConfig {
            api_key: api_key.clone(),
            ..AnthropicConfig::default()
        })
        .context("failed to build Anthropic client")?;
        router = router.with_client(Provider::Anthropic, Arc::new(client));
    }
    Ok(router)
}

async fn run_cli(cli: Cli) -> Result<()> {
    let router = Arc::new(build_router(&cli)?);
    let store = GoogleSheetsClient::new(GoogleSheetsConfig {
        access_token: cli.google_access_token.clone(),
        spreadsheet_id: cli.spreadsheet_id.clone(),
        ..GoogleSheetsConfig::default()
    })
    .context("failed to build Sheets client")?;

    let orchestrator = Orchestrator::new(router, Arc::new(store));
    let mut events = orchestrator.run(cli.task, cli.range);

    let mut failed = None;
    while let Some(event) = events.next().await {
        println!("{event}");
        if let RunEvent::Failed { error } = event {
            failed = Some(error);
        }
    }
    if let Some(error) = failed {
        bail!("task did not complete: {error}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}
