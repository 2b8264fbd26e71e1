//! mc-tools - command line entry point
//!
//! Lists the tool definitions and runs single tool calls against the
//! configured workspace, printing the JSON result a model would receive.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use mc::config::GatewayConfig;
use mc::tools::{get_all_tools, ToolCall, ToolExecutor};

#[derive(Parser)]
#[command(name = "mc-tools", version, about = "Sandboxed file tools for LLM tool calling")]
struct Cli {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Allowed root directory (repeatable, overrides config and environment)
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Per-call timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the OpenRouter tool definitions as JSON
    Schemas,
    /// Print the effective configuration
    Config,
    /// Run one tool call and print its result
    Call {
        /// Tool name, e.g. read_file
        name: String,
        /// JSON arguments; read from stdin when omitted
        arguments: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(success) => {
            if !success {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(2);
        }
    }
}

/// Build the configuration: file or defaults, then `MC_*` variables, then flags
fn load_config(cli: &Cli) -> Result<GatewayConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::from_yaml_file(path)?,
        None => GatewayConfig::default(),
    }
    .apply_env(|var| std::env::var(var).ok())?;

    if !cli.roots.is_empty() {
        config = config.with_roots(cli.roots.clone());
    }
    if cli.timeout_ms.is_some() {
        config = config.with_timeout_ms(cli.timeout_ms);
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Schemas => {
            println!("{}", serde_json::to_string_pretty(&get_all_tools())?);
            Ok(true)
        }
        Command::Config => {
            for line in config.get_summary() {
                println!("{}", line);
            }
            Ok(true)
        }
        Command::Call { name, arguments } => {
            let arguments = match arguments {
                Some(arguments) => arguments,
                None => read_stdin()?,
            };

            let executor = ToolExecutor::new(config)?;
            info!("Running {} in {}", name, executor.gateway().guard().primary_root().display());

            let call = ToolCall::new("cli", name, arguments);
            let result = executor.execute_tool_call(&call).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(result.is_success())
        }
    }
}

fn read_stdin() -> io::Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(buffer)
}
