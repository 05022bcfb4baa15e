//! RAG CLI - Command-line interface for the FAQ retrieval MCP server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use rag_core::{RagConfig, RagError};
use rag_mcp::{run_http, serve_stdio, AppContext, RagMcpServer, MCP_PATH};

/// RAG - Machine learning FAQ retrieval and web search over MCP
#[derive(Parser)]
#[command(name = "rag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/rag-mcp/config.toml, then ./rag-mcp.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server
    Serve {
        /// Serve over stdin/stdout instead of HTTP
        #[arg(long)]
        stdio: bool,

        /// Address to bind (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Query the FAQ retriever
    Search {
        /// Search query
        query: String,

        /// Number of entries to return (default: retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the raw hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the web with the configured provider
    Web {
        /// Search query
        query: String,

        /// Number of results (default: web_search.default_num_results)
        #[arg(short = 'n', long)]
        num_results: Option<usize>,
    },

    /// Print the tools with their schemas
    Tools,
}

fn load_config(path: Option<PathBuf>) -> Result<RagConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => RagConfig::load(&path)?,
        None => RagConfig::load_default()?,
    };
    debug!("Loaded config: {:?}", config);
    Ok(config)
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr; stdout belongs to the stdio transport and command output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = load_config(cli.config)?;

    match cli.command {
        Commands::Serve { stdio, host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, stdio).await?;
        }
        Commands::Search {
            query,
            top_k,
            json,
        } => {
            let k = top_k.unwrap_or(config.retrieval.top_k);
            let context = build_context(config).await?;
            search(&context, &query, k, json).await?;
        }
        Commands::Web { query, num_results } => {
            let n = num_results.unwrap_or(config.web_search.default_num_results);
            web(&config, &query, n).await?;
        }
        Commands::Tools => {
            let context = build_context(config).await?;
            tools(context)?;
        }
    }

    Ok(())
}

async fn build_context(config: RagConfig) -> Result<Arc<AppContext>, Box<dyn std::error::Error>> {
    match AppContext::build(config).await {
        Ok(context) => Ok(Arc::new(context)),
        Err(e) => {
            error!("Startup failed: {}", e);
            if matches!(e, RagError::Embedding { .. }) {
                eprintln!(
                    "Hint: place model.onnx and tokenizer.json under embedding.model_path, \
                     or set embedding.backend = \"hashing\" in the config."
                );
            }
            Err(e.into())
        }
    }
}

async fn serve(config: RagConfig, stdio: bool) -> Result<(), Box<dyn std::error::Error>> {
    let server_config = config.server.clone();
    let server = RagMcpServer::new(build_context(config).await?)?;

    if stdio {
        serve_stdio(server).await?;
    } else {
        eprintln!(
            "MCP server listening on http://{}{}",
            server_config.bind_address(),
            MCP_PATH
        );
        run_http(server, &server_config).await?;
    }

    Ok(())
}

async fn search(
    context: &AppContext,
    query: &str,
    k: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let hits = context.retriever.search_hits(query, k).await?;
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    let text = context.retriever.search(query, k).await?;
    if text.is_empty() {
        eprintln!("No results.");
    } else {
        println!("{}", text);
    }
    Ok(())
}

async fn web(config: &RagConfig, query: &str, n: usize) -> Result<(), Box<dyn std::error::Error>> {
    let port = rag_web::from_config(&config.web_search);
    let results = port.search(query, n).await?;

    if results.is_empty() {
        eprintln!("No results.");
    }
    for (i, line) in rag_web::format_results(&results).iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", line);
    }
    Ok(())
}

fn tools(context: Arc<AppContext>) -> Result<(), Box<dyn std::error::Error>> {
    let server = RagMcpServer::new(context)?;

    let listing: Vec<_> = server
        .registry()
        .descriptors()
        .into_iter()
        .map(|d| {
            json!({
                "name": d.name,
                "description": d.description,
                "input_schema": d.input_schema,
                "output_schema": d.output_schema,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
