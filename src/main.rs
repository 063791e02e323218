//! MCP Server Entry Point
//!
//! This is the main entry point for the MCP server. It parses flags,
//! initializes logging, installs the signal handlers, loads configuration,
//! acquires the server context and serves the configured transport until the
//! client leaves or a signal arrives.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use api_gateway_mcp::core::{
    CliArgs, Config, ConfigSources, ContextScope, LoggingConfig, McpServer, ServerContext,
    Shutdown, TransportService,
};
use api_gateway_mcp::domains::tools::{ToolRegistry, definitions};

fn main() -> ExitCode {
    let sources = ConfigSources::gather(CliArgs::parse());

    // Initialize logging
    init_logging(&LoggingConfig::from_sources(&sources).level);

    match run(sources) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(sources: ConfigSources) -> Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let result = runtime.block_on(async move {
        let shutdown = Shutdown::new();
        tokio::spawn(shutdown.clone().listen_for_signals());

        serve(Config::from_sources(&sources), shutdown).await
    });

    // A blocking stdin read may still be parked on a runtime thread.
    runtime.shutdown_timeout(Duration::from_millis(500));

    result
}

async fn serve(config: Config, shutdown: Shutdown) -> Result<ExitCode> {
    info!("Starting {} v{}", config.server.name, config.server.version);

    let mut registry = ToolRegistry::new();
    definitions::register_builtin(&mut registry)?;
    let registry = Arc::new(registry);

    let context = Arc::new(ServerContext::acquire(&config)?);

    if shutdown.is_triggered() {
        info!("Interrupted during startup");
        context.release();
        return Ok(ExitCode::SUCCESS);
    }

    let Config {
        server: server_info,
        transport,
        ..
    } = config;
    let transport = TransportService::new(transport);

    ContextScope::run(context, |context| async move {
        context.ensure_routable(&registry)?;

        let server = McpServer::new(server_info, context, registry);
        info!("Server initialized with {} tools", server.list_tools().len());

        transport.run(server, shutdown).await?;
        Ok::<_, api_gateway_mcp::Error>(())
    })
    .await?;

    info!("Server shutting down");

    Ok(ExitCode::SUCCESS)
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format. Output goes
/// to stderr so that stdout stays reserved for the STDIO transport.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
