//! Suite Gateway CLI
//!
//! Generates the gateway document of a suite from its sub-service documents.
//!
//! Usage:
//!   suite-gateway --root openapi generate accounting
//!   suite-gateway check accounting
//!   suite-gateway generate            # every suite under the root
//!   suite-gateway config --write gateway.toml

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use suite_gateway::{Gateway, GatewayConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "suite-gateway")]
#[command(about = "Merge sub-service OpenAPI documents into a suite gateway")]
struct Cli {
    /// Directory holding one subdirectory per suite
    #[arg(short, long, default_value = "openapi")]
    root: PathBuf,

    /// Extra configuration file, layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the gateway document of a suite (or of every suite)
    Generate {
        /// Suite name, e.g. "accounting"
        system: Option<String>,
        /// Output file; `.json` selects JSON output
        #[arg(short, long, requires = "system")]
        output: Option<PathBuf>,
    },

    /// Fail if the committed gateway document is out of date
    Check {
        system: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the sub-services of a suite
    List { system: String },

    /// Print the effective configuration
    Config {
        /// Write it to this TOML file instead
        #[arg(short, long)]
        write: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the command ran but the result is a failure
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = GatewayConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Commands::Config { write } = &cli.command {
        match write {
            Some(path) => {
                config
                    .save(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("✅ Wrote configuration to {}", path.display());
            }
            None => print!("{}", config.to_toml()?),
        }
        return Ok(true);
    }

    let gateway = Gateway::new(&cli.root, config);

    match cli.command {
        Commands::Generate {
            system: Some(system),
            output,
        } => {
            println!("🔧 Generating {} gateway", system);
            match gateway.generate(&system, output.as_deref())? {
                Some(report) => {
                    println!("✅ Wrote {}", report.output.display());
                    println!("   Services:  {}", report.services.join(", "));
                    println!("   Paths:     {}", report.path_count);
                    println!("   Schemas:   {}", report.schema_count);
                    println!("   Checksum:  {}", report.checksum.short());
                }
                None => println!("⚠️  No sub-services found for {}, nothing written", system),
            }
            Ok(true)
        }

        Commands::Generate { system: None, .. } => {
            println!("🔧 Generating every suite under {}", cli.root.display());
            let reports = gateway.generate_all()?;
            for report in &reports {
                println!(
                    "  ✅ {} - {} services, {} paths -> {}",
                    report.system,
                    report.services.len(),
                    report.path_count,
                    report.output.display()
                );
            }
            println!("\n📊 {} gateway document(s) generated", reports.len());
            Ok(true)
        }

        Commands::Check { system, output } => {
            println!("🔍 Checking {} gateway", system);
            let Some(report) = gateway.check(&system, output.as_deref())? else {
                println!("⚠️  No sub-services found for {}", system);
                return Ok(true);
            };

            if report.is_current() {
                println!(
                    "✅ {} is up to date ({})",
                    report.output.display(),
                    report.expected.short()
                );
                return Ok(true);
            }

            match &report.actual {
                Some(actual) => println!(
                    "❌ {} is stale: {} on disk, {} expected",
                    report.output.display(),
                    actual.short(),
                    report.expected.short()
                ),
                None => println!("❌ {} does not exist", report.output.display()),
            }
            println!();
            print!("{}", report.diff);
            Ok(false)
        }

        Commands::List { system } => {
            let catalogue = gateway.discover(&system)?;
            if catalogue.is_empty() {
                println!("⚠️  No sub-services found for {}", system);
                return Ok(true);
            }
            println!("📦 {} ({} services)", system, catalogue.len());
            for service in catalogue.values() {
                println!("  {:<24} {}", service.name, service.mount_path);
            }
            Ok(true)
        }

        Commands::Config { .. } => Ok(true),
    }
}
