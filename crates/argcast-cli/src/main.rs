//! CLI binary for inspecting and exercising argcast pipelines.

mod catalog;
mod input;

use std::path::PathBuf;

use argcast_pipeline::{CastEngine, Samples};
use argcast_types::Value;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "argcast", version, about = "Declarative argument cast pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the builtin pipelines
    List,

    /// Show the steps of a pipeline
    Describe {
        /// Pipeline name (see `argcast list`)
        name: String,

        /// Print the description as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cast a value through a pipeline
    Cast {
        /// Pipeline name (see `argcast list`)
        name: String,

        /// Value as JSON (null, number, string, bool or array)
        #[arg(conflicts_with_all = ["missing", "file"])]
        value: Option<String>,

        /// Cast the missing-argument marker
        #[arg(long, conflicts_with = "file")]
        missing: bool,

        /// Cast every element of a JSON array file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print values the pipeline accepts and rejects
    Samples {
        /// Pipeline name (see `argcast list`)
        name: String,

        /// Print the samples as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::List => cmd_list(),
        Commands::Describe { name, json } => cmd_describe(&name, json)?,
        Commands::Cast {
            name,
            value,
            missing,
            file,
        } => cmd_cast(&name, value.as_deref(), missing, file)?,
        Commands::Samples { name, json } => cmd_samples(&name, json)?,
    }

    Ok(())
}

fn lookup(name: &str) -> anyhow::Result<&'static catalog::Entry> {
    catalog::find(name)
        .ok_or_else(|| anyhow::anyhow!("unknown pipeline '{name}' (see `argcast list`)"))
}

fn cmd_list() {
    let width = catalog::entries()
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(0);
    for entry in catalog::entries() {
        println!("{:<width$}  {}", entry.name, entry.summary);
    }
}

fn cmd_describe(name: &str, json: bool) -> anyhow::Result<()> {
    let description = lookup(name)?.build().describe();
    if json {
        println!("{}", description.to_json()?);
    } else {
        print!("{description}");
    }
    Ok(())
}

fn cmd_cast(
    name: &str,
    value: Option<&str>,
    missing: bool,
    file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let pipeline = lookup(name)?.build();
    let values = match (value, missing, file) {
        (_, _, Some(path)) => input::load_values(&path)?,
        (_, true, None) => vec![Value::Missing],
        (Some(text), false, None) => vec![input::parse_value(text)?],
        (None, false, None) => {
            anyhow::bail!("nothing to cast: pass a JSON value, --missing or --file")
        }
    };

    let engine = CastEngine::default();
    let mut failed = 0usize;
    for value in values {
        let shown = value.to_string();
        match engine.cast(&pipeline, value) {
            Ok(outcome) => {
                println!("{shown} => {}", outcome.value);
                for warning in &outcome.warnings {
                    println!("  warning: {warning}");
                }
            }
            Err(err) => {
                failed += 1;
                println!("{shown} => error: {err}");
            }
        }
    }

    if failed > 0 {
        tracing::debug!(pipeline = %name, failed, "Casts failed");
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_samples(name: &str, json: bool) -> anyhow::Result<()> {
    let pipeline = lookup(name)?.build();
    let samples = Samples::for_pipeline(&pipeline, &CastEngine::default());
    if json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
        return Ok(());
    }
    if samples.is_empty() {
        println!("No samples: pipeline '{name}' has no filters");
        return Ok(());
    }
    println!("Accepted:");
    for value in &samples.positive {
        println!("  {value}");
    }
    println!("Rejected:");
    for value in &samples.negative {
        println!("  {value}");
    }
    Ok(())
}
