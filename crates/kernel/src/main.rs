//! Folio CLI
//!
//! Validates and compiles content bundles.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio_kernel::bundle::{Bundle, BundleRun};
use folio_kernel::config::Config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum nested group levels (overrides FOLIO_MAX_GROUP_DEPTH).
    #[arg(long, global = true)]
    max_group_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit every entry of a bundle and report which were accepted.
    Validate { bundle: PathBuf },

    /// Submit every entry of a bundle and print the compiled documents.
    Compile { bundle: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(depth) = cli.max_group_depth {
        anyhow::ensure!(depth >= 1, "--max-group-depth must be at least 1");
        config.max_group_depth = depth;
    }
    info!(max_group_depth = config.max_group_depth, "configuration loaded");

    let (path, compile) = match &cli.command {
        Command::Validate { bundle } => (bundle, false),
        Command::Compile { bundle } => (bundle, true),
    };
    let run = Bundle::load(path).await?.run(&config).await?;

    if compile {
        let documents = compiled(&run).await?;
        println!(
            "{}",
            serde_json::to_string_pretty(&documents).context("failed to render documents")?
        );
    } else {
        print_summary(&run);
    }

    Ok(if run.rejected().next().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_summary(run: &BundleRun) {
    for outcome in &run.outcomes {
        match &outcome.result {
            Ok(entry) => println!(
                "ok     entries[{}] ({}): {}",
                outcome.index, outcome.template, entry.id
            ),
            Err(err) => println!(
                "error  entries[{}] ({}): {err}",
                outcome.index, outcome.template
            ),
        }
    }
    println!(
        "{} accepted, {} rejected",
        run.accepted().count(),
        run.rejected().count()
    );
}

/// Compiled documents of every accepted entry, read back through the service.
async fn compiled(run: &BundleRun) -> Result<Value> {
    let mut out = Vec::new();
    for outcome in run.accepted() {
        let Ok(entry) = &outcome.result else {
            continue;
        };
        let documents = run
            .service
            .get_compiled(&outcome.template, entry.id)
            .await
            .with_context(|| format!("failed to compile entry '{}'", entry.id))?;
        out.push(json!({
            "template": outcome.template,
            "entry": entry.id,
            "documents": documents,
        }));
    }
    Ok(Value::Array(out))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
