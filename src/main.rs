use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod docx;
mod engine;
mod error;
mod input;
mod mcp;
mod tools;

use config::ServerConfig;

#[derive(Parser)]
#[command(name = "mcp-word-edit")]
#[command(
    version,
    about = "Positional editing of Word (.docx) documents over MCP"
)]
struct Cli {
    /// Directory every document and image path is resolved against
    #[arg(long, global = true, env = "WORD_MCP_ROOT")]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct InputArgs {
    /// Path to the .docx file
    #[arg(long)]
    path: String,
    /// Output JSON structuredContent
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct StructureArgs {
    #[command(flatten)]
    input: InputArgs,
    /// First paragraph to read
    #[arg(long)]
    start_index: Option<u64>,
    /// Paragraphs per page
    #[arg(long)]
    count: Option<u64>,
    /// Include empty paragraphs
    #[arg(long)]
    include_empty: bool,
}

#[derive(Args, Clone)]
struct TablesArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Only read this table
    #[arg(long)]
    table_index: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP stdio server
    Serve {
        /// Serve MCP over stdio (NDJSON)
        #[arg(long)]
        stdio: bool,
    },
    /// Paragraph, table and image counts
    Info(InputArgs),
    /// Paragraph details, one page at a time
    Structure(StructureArgs),
    /// Table contents
    Tables(TablesArgs),
    /// Plain text in body order
    Text(InputArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let config = ServerConfig::new(&root)
        .with_context(|| format!("invalid document root {}", root.display()))?;

    match cli.command {
        Commands::Serve { stdio } => {
            if stdio {
                run_stdio_server(&config)
            } else {
                anyhow::bail!("only --stdio transport is supported")
            }
        }
        Commands::Info(args) => run_tool(
            &config,
            mcp::contracts::TOOL_GET_DOCUMENT_INFO,
            build_input_args(&args),
            args.json,
        ),
        Commands::Structure(args) => {
            let mut map = build_input_args(&args.input);
            if let Some(start_index) = args.start_index {
                map.insert("start_index".to_string(), json!(start_index));
            }
            if let Some(count) = args.count {
                map.insert("count".to_string(), json!(count));
            }
            map.insert("include_empty".to_string(), json!(args.include_empty));
            run_tool(
                &config,
                mcp::contracts::TOOL_READ_DOCUMENT_STRUCTURE,
                map,
                args.input.json,
            )
        }
        Commands::Tables(args) => {
            let mut map = build_input_args(&args.input);
            if let Some(table_index) = args.table_index {
                map.insert("table_index".to_string(), json!(table_index));
            }
            run_tool(
                &config,
                mcp::contracts::TOOL_READ_TABLES,
                map,
                args.input.json,
            )
        }
        Commands::Text(args) => run_tool(
            &config,
            mcp::contracts::TOOL_GET_DOCUMENT_TEXT,
            build_input_args(&args),
            args.json,
        ),
    }
}

/// Logs go to stderr; stdout carries the protocol.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn build_input_args(input: &InputArgs) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("file_path".to_string(), json!(input.path));
    map
}

fn run_tool(
    config: &ServerConfig,
    name: &str,
    args: Map<String, Value>,
    json_output: bool,
) -> Result<()> {
    let result = tools::dispatch(config, name, &Value::Object(args));
    print_tool_result(result, json_output)
}

fn print_tool_result(result: Value, json_output: bool) -> Result<()> {
    let is_error = result
        .get("isError")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    if is_error {
        let message = result
            .get("structuredContent")
            .and_then(|value| value.get("error"))
            .and_then(|value| value.get("message"))
            .and_then(|value| value.as_str())
            .unwrap_or("tool error");
        eprintln!("{message}");
        process::exit(1);
    }

    if json_output {
        let structured = result
            .get("structuredContent")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let output = serde_json::to_string_pretty(&structured)?;
        println!("{output}");
        return Ok(());
    }

    let text = result
        .get("content")
        .and_then(|value| value.as_array())
        .and_then(|arr| arr.first())
        .and_then(|value| value.get("text"))
        .and_then(|value| value.as_str())
        .unwrap_or("");
    println!("{text}");
    Ok(())
}

fn run_stdio_server(config: &ServerConfig) -> Result<()> {
    info!(root = %config.root().display(), "serving MCP over stdio");
    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = stdin.lock().lines();
    let mut writer = io::BufWriter::new(stdout.lock());

    for line in reader {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let request: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                debug!("skipping unparsable request: {err}");
                continue;
            }
        };

        let method = request.get("method").and_then(|value| value.as_str());
        let id = request.get("id").cloned();
        let response = match (method, id) {
            (Some("initialize"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2025-11-25",
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }
            })),
            (Some("tools/list"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "tools": mcp::tool_definitions()
                }
            })),
            (Some("tools/call"), Some(id)) => {
                let result = handle_tool_call(config, &request);
                Some(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": result
                }))
            }
            _ => None,
        };

        if let Some(response) = response {
            let serialized =
                serde_json::to_string(&response).context("failed to serialize response")?;
            writeln!(writer, "{serialized}").context("failed to write response")?;
            writer.flush().context("failed to flush response")?;
        }
    }

    Ok(())
}

fn handle_tool_call(config: &ServerConfig, request: &serde_json::Value) -> serde_json::Value {
    let params = request.get("params");
    let Some(params) = params.and_then(|value| value.as_object()) else {
        return tools::error_result(
            mcp::errors::INVALID_ARGUMENT,
            "params must be an object",
            None,
        );
    };

    let name = params.get("name").and_then(|value| value.as_str());
    let Some(name) = name else {
        return tools::error_result(
            mcp::errors::INVALID_ARGUMENT,
            "params.name must be a string",
            None,
        );
    };

    let args = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    tools::dispatch(config, name, &args)
}
