use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use pubmed_ris::config::{default_config_path, find_config_file, load_config, Config, ConfigFile};
use pubmed_ris::pipeline::{read_dois, Pipeline};
use pubmed_ris::sources::PubMedSource;
use pubmed_ris::ui::{self, ConversionProgress, Status};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PubMed RIS - Convert a list of DOIs into RIS records using PubMed metadata
#[derive(Parser, Debug)]
#[command(name = "pubmed-ris")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert a list of DOIs into RIS records using PubMed metadata", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output and non-error logs
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Contact email sent to NCBI with every request
    #[arg(long, global = true, env = "NCBI_EMAIL")]
    email: Option<String>,

    /// NCBI API key
    #[arg(long, global = true, env = "NCBI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Pause after each DOI in milliseconds (at least 300 against NCBI)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up every DOI in PubMed and write RIS records
    #[command(alias = "c")]
    Convert {
        /// Tab-separated input file with a DOI column
        #[arg(long, short, env = "INPUT_PATH")]
        input: PathBuf,

        /// RIS output file; misses go to <stem>_not_found.txt next to it
        #[arg(long, short, env = "OUTPUT_PATH")]
        output: PathBuf,
    },

    /// Read and normalize the DOIs of an input file without contacting PubMed
    #[command(alias = "n")]
    Normalize {
        /// Tab-separated input file with a DOI column
        #[arg(long, short, env = "INPUT_PATH")]
        input: PathBuf,
    },

    /// Write a default configuration file
    InitConfig {
        /// Where to write (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("PubMed RIS - Environment Variables");
    println!();
    println!("Paths:");
    println!("  INPUT_PATH                  Input file for convert/normalize");
    println!("  OUTPUT_PATH                 RIS output file for convert");
    println!();
    println!("NCBI:");
    println!("  NCBI_EMAIL                  Contact email sent with every request");
    println!("  NCBI_API_KEY                API key (higher rate limits)");
    println!();
    println!("Configuration overrides:");
    println!("  PUBMED_RIS_PUBMED__EMAIL    Same as NCBI_EMAIL");
    println!("  PUBMED_RIS_PUBMED__API_KEY  Same as NCBI_API_KEY");
    println!("  PUBMED_RIS_PUBMED__TOOL     Tool name sent with every request (default: pubmed-ris)");
    println!("  PUBMED_RIS_PUBMED__BASE_URL E-utilities base URL");
    println!("  PUBMED_RIS_RUN__DELAY_MS    Pause after each DOI (default: 300)");
    println!("  PUBMED_RIS_RUN__TIMEOUT_SECS  Request timeout (default: 30)");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pubmed_ris={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        Some(Commands::Convert { input, output }) => {
            let config = build_config(&cli)?;
            convert(&config, input, output, cli.quiet).await?;
        }
        Some(Commands::Normalize { input }) => {
            let dois = read_dois(input)
                .with_context(|| format!("Failed to read DOIs from {}", input.display()))?;
            for doi in dois {
                println!("{}", doi);
            }
        }
        Some(Commands::InitConfig { path, force }) => {
            let path = match path.clone().or_else(default_config_path) {
                Some(path) => path,
                None => anyhow::bail!("No config directory found; pass --path"),
            };
            ConfigFile::save(&Config::default(), &path, *force)?;
            ui::print_status(
                Status::Success,
                &format!("Wrote configuration to {}", path.display()),
            );
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Layer the config file, environment and command-line flags.
fn build_config(cli: &Cli) -> Result<Config> {
    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let mut config = load_config(config_path.as_deref())?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(email) = &cli.email {
        config.pubmed.email = Some(email.clone());
    }
    if let Some(api_key) = &cli.api_key {
        config.pubmed.api_key = Some(api_key.clone());
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.run.delay_ms = delay_ms;
    }
    if let Some(timeout) = cli.timeout {
        config.run.timeout_secs = timeout;
    }
}

async fn convert(config: &Config, input: &Path, output: &Path, quiet: bool) -> Result<()> {
    if config.pubmed.email.is_none() {
        tracing::warn!(
            "No contact email configured; NCBI asks clients to set one (--email or NCBI_EMAIL)"
        );
    }

    let run = config.run_config();
    let source = PubMedSource::new(&config.pubmed, run.timeout)?;
    let pipeline = Pipeline::new(run, Arc::new(source));

    let mut progress = ConversionProgress::new(quiet);
    let result = pipeline
        .run(input, output, &mut progress)
        .await
        .with_context(|| format!("Conversion of {} failed", input.display()))?;

    if !quiet {
        ui::print_summary(&result, pipeline.source().name());
    }

    Ok(())
}
