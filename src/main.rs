//! askalcf - query the AskALCF assistant from the command line
//!
//! This binary asks one-off questions, runs an MCP server over stdio, or
//! (with the `http` feature) serves the same tools over HTTP.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use askalcf::config::DEFAULT_TIMEOUT_MS;
use askalcf::{McpServer, Query, QueryConfig, QueryOrchestrator};

/// Query the AskALCF assistant through browser automation.
#[derive(Parser, Debug)]
#[command(name = "askalcf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask one question and print the answer.
    Ask {
        /// The question to ask (5-1000 characters).
        question: String,

        /// Overall timeout in milliseconds.
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout: u64,

        /// Show the browser window while the query runs.
        #[arg(long)]
        no_headless: bool,
    },

    /// Run the MCP server on stdio.
    Mcp,

    /// Run the HTTP server.
    #[cfg(feature = "http")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind.
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Log to stderr (not stdout, which carries answers and MCP traffic)
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Ask {
            question,
            timeout,
            no_headless,
        } => run_ask(&question, timeout, no_headless).await,
        Command::Mcp => {
            tracing::info!(
                "Starting {} v{}",
                askalcf::server::SERVER_NAME,
                askalcf::server::SERVER_VERSION
            );
            match McpServer::new().run_stdio().await {
                Ok(()) => {
                    tracing::info!("Server exited cleanly");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        #[cfg(feature = "http")]
        Command::Serve { host, port } => {
            match askalcf::http::serve(&host, port, QueryConfig::default()).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("HTTP server error: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run_ask(question: &str, timeout: u64, no_headless: bool) -> ExitCode {
    let query = match Query::new(question, timeout) {
        Ok(query) => query,
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            return ExitCode::FAILURE;
        }
    };

    let config = QueryConfig {
        headless: !no_headless,
        ..QueryConfig::default()
    };
    let orchestrator = QueryOrchestrator::with_config(config);

    tokio::select! {
        outcome = orchestrator.ask(&query) => match outcome {
            Ok(answer) => {
                println!("{answer}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("Error: {}", err.user_message());
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            ExitCode::from(130)
        }
    }
}
