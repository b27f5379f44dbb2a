use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use serde_json::json;
use tracing::info;

use ado_mcp::{
    AdoHttpClient, Config, ConnectionSettings, DomainClients,
    cli::{Cli, Command, ConnectionArgs},
    config::Domain,
    logging::init_logging,
    mcp::{McpServer, ServerInfo, ToolRegistry, build_registry, serve_stdio},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log.log_config());

    match cli.into_command() {
        Command::InitConfig => init_config(),
        Command::Tools(args) => print_tools(&args),
        Command::Serve(args) => serve(&args).await,
    }
}

fn init_config() -> Result<()> {
    match Config::create_sample_config()? {
        Some(path) => println!("Sample configuration written to {}", path.display()),
        None => println!(
            "Configuration file already exists at {}",
            Config::config_path()?.display()
        ),
    }
    Ok(())
}

/// List the tools a configuration exposes; no credentials are needed.
fn print_tools(args: &ConnectionArgs) -> Result<()> {
    let config = Config::load(args)?;
    let domains = config
        .domains
        .map(|d| d.into_value())
        .unwrap_or_else(|| Domain::ALL.to_vec());
    let read_only = config.read_only.is_some_and(|r| *r.value());
    let organization = config
        .organization
        .map(|o| o.into_value())
        .unwrap_or_else(|| "organization".to_string());

    let settings = ConnectionSettings::new(organization, SecretString::from(String::new()));
    let clients = DomainClients::new(AdoHttpClient::new(settings)?, None);
    let registry = build_registry(&clients, &domains, read_only);

    let listing = json!({ "tools": registry.definitions() });
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

async fn serve(args: &ConnectionArgs) -> Result<()> {
    let registry = registry_from_config(args)?;
    let server = McpServer::new(registry, ServerInfo::default());
    serve_stdio(server).await.context("MCP server stopped")?;
    info!("Input closed, shutting down");
    Ok(())
}

fn registry_from_config(args: &ConnectionArgs) -> Result<ToolRegistry> {
    let config = Config::load(args)?
        .resolve()
        .context("Invalid configuration")?;
    info!(
        organization = %config.organization,
        project = config.project.as_deref().unwrap_or("<none>"),
        domains = %config.domains.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(","),
        read_only = config.read_only,
        "Configuration resolved"
    );

    let http = AdoHttpClient::new(config.connection_settings())?;
    let clients = DomainClients::new(http, config.project.clone());
    Ok(build_registry(&clients, &config.domains, config.read_only))
}
