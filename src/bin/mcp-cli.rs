//! Command-line client for the MCP tool server.

use clap::{Parser, Subcommand};
use colored::Colorize;
use mcp_tool_server::client::{ClientError, DEFAULT_SERVER_URL, McpClient};
use mcp_tool_server::core::CallResult;
use mcp_tool_server::init_tracing;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool reported an error")]
    ToolFailed,
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "mcp-cli", version, about = "A command-line interface for interacting with the MCP server")]
struct Cli {
    /// MCP server URL
    #[arg(short, long, global = true, env = "MCP_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available tools on the MCP server
    ListTools,

    /// Interact with the calculator tool
    #[command(after_help = "Examples:\n  mcp-cli calculator 5 3 add\n  mcp-cli calculator 28 7 divide")]
    Calculator {
        #[arg(allow_hyphen_values = true)]
        num1: i64,
        #[arg(allow_hyphen_values = true)]
        num2: i64,
        /// add, subtract, multiply or divide (or + - * /)
        operation: String,
    },

    /// Greet someone with the hello_world tool
    Greet { name: String },

    /// Call any tool with a JSON object of arguments
    Call {
        tool: String,
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(CliError::ToolFailed) => 1,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("{}", e);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    let client = McpClient::new(&cli.server)?;
    if let Err(e) = client.initialize().await {
        warn!(error = %e, server = %client.endpoint(), "Error initializing MCP client");
    }

    match cli.command {
        Commands::ListTools => {
            let tools = client.list_tools().await?;
            println!("Available tools: {}", tools.len());
            for tool in tools {
                println!("- {}: {}", tool.name.cyan().bold(), tool.description);
            }
            Ok(())
        }
        Commands::Calculator {
            num1,
            num2,
            operation,
        } => {
            let args = object(serde_json::json!({
                "num1": num1,
                "num2": num2,
                "operation": operation,
            }));
            print_result(&client.call_tool("calculator", args).await?)
        }
        Commands::Greet { name } => {
            let args = object(serde_json::json!({ "name": name }));
            print_result(&client.call_tool("hello_world", args).await?)
        }
        Commands::Call { tool, args } => {
            let args = match serde_json::from_str::<Value>(&args) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(CliError::InvalidArgument(
                        "--args must be a JSON object".to_string(),
                    ));
                }
                Err(e) => {
                    return Err(CliError::InvalidArgument(format!(
                        "--args is not valid JSON: {}",
                        e
                    )));
                }
            };
            print_result(&client.call_tool(&tool, args).await?)
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn print_result(result: &CallResult) -> CliResult<()> {
    let text = result.first_text().unwrap_or_default();
    if result.is_error {
        eprintln!("{}", text.red());
        return Err(CliError::ToolFailed);
    }
    println!("{}", text);
    Ok(())
}
