use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use insurance_txn_handler::{
    init_logging, write_results, AppConfig, Pipeline, RecordStore, Tool, ToolRegistry,
    ToolResponse,
};

#[derive(Debug, Parser)]
#[command(
    name = "insurance-txn-handler",
    version,
    about = "Diagnose and simulate fixes for failed insurance enrollment transactions",
    after_help = "Examples:\n  insurance-txn-handler run\n  insurance-txn-handler inspect 1001\n  insurance-txn-handler tool analyze_error 1001"
)]
struct Cli {
    /// CSV of failed transactions (overrides TXN_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the four-step pipeline over every transaction and write the results table
    Run {
        /// Results CSV (overrides TXN_OUTPUT_FILE)
        #[arg(long)]
        output_file: Option<PathBuf>,
    },
    /// Run every tool for one transaction and print the outputs
    Inspect { transaction_id: String },
    /// Invoke a single tool by name and print its JSON response
    Tool { name: String, transaction_id: String },
    /// Browse failed transactions in the terminal
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Invalid environment configuration")?;
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    init_logging(&config.logging);

    // A missing source is fatal: never run against a partial or empty store
    let store = RecordStore::from_path(&config.data_file)
        .with_context(|| format!("Failed to load transactions from {}", config.data_file.display()))?;

    match cli.command.unwrap_or(Command::Run { output_file: None }) {
        Command::Run { output_file } => {
            let output_file = output_file.unwrap_or(config.output_file);
            run_pipeline(&store, &output_file)
        }
        Command::Inspect { transaction_id } => inspect(&store, &transaction_id),
        Command::Tool {
            name,
            transaction_id,
        } => invoke_tool(&store, &name, &transaction_id),
        Command::Ui => run_ui_mode(store),
    }
}

fn run_pipeline(store: &RecordStore, output_file: &std::path::Path) -> Result<()> {
    let report = Pipeline::new(store).run();

    write_results(output_file, &report.results)
        .with_context(|| format!("Failed to write results to {}", output_file.display()))?;

    println!("{}", report.summary());
    println!("Results written to {}", output_file.display());

    Ok(())
}

fn inspect(store: &RecordStore, transaction_id: &str) -> Result<()> {
    let tools = ToolRegistry::new(store);

    for tool in Tool::ALL {
        println!("── {} ──", tool.name());
        match tools.invoke(tool, transaction_id) {
            ToolResponse::Record(record) => {
                println!("{}\n", serde_json::to_string_pretty(&record.to_json())?)
            }
            other => println!("{}\n", other.as_text()),
        }
    }

    Ok(())
}

fn invoke_tool(store: &RecordStore, name: &str, transaction_id: &str) -> Result<()> {
    let response = ToolRegistry::new(store).invoke_by_name(name, transaction_id)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: RecordStore) -> Result<()> {
    use insurance_txn_handler::ui;

    let mut app = ui::App::new(store);
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: RecordStore) -> Result<()> {
    anyhow::bail!("TUI mode not available; rebuild with `--features tui`")
}
