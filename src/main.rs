//! Churn Risk Engine - Main Entry Point
//!
//! Loads the model artifact once, then scores customers from the command line
//! or an interactive session.

use anyhow::{Context, Result};
use churn_risk::{
    config::{AppConfig, LogFormat, LoggingConfig},
    metrics::SessionMetrics,
    render::{self, OutputFormat},
    types::{CustomerProfile, InputRanges},
    RiskPipeline,
};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "churn-risk", version, about = "Credit card retention engine")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model artifact, overriding the configured path
    #[arg(long, global = true)]
    artifact: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score one customer
    Predict {
        /// Total transactions count (last year)
        #[arg(long, default_value_t = 60)]
        count: u32,

        /// Total transaction amount (last year)
        #[arg(long, default_value_t = 4000.0)]
        amount: f64,

        /// Total revolving balance
        #[arg(long, default_value_t = 1000.0)]
        balance: f64,

        /// Also print the feature vector sent to the model
        #[arg(long)]
        show_features: bool,
    },
    /// Score customers read from stdin, one `count amount balance` per line
    Interactive,
    /// Show the artifact's model type, columns and defaults
    Inspect,
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load()?,
    };
    if let Some(artifact) = &cli.artifact {
        config.artifact.path = artifact.clone();
    }
    Ok(config)
}

/// Clamp inputs into the accepted ranges, warning about any that moved
fn clamp_profile(profile: CustomerProfile, ranges: &InputRanges) -> CustomerProfile {
    let out_of_range = ranges.out_of_range(&profile);
    if out_of_range.is_empty() {
        return profile;
    }

    let clamped = ranges.clamp(&profile);
    warn!(
        fields = ?out_of_range,
        requested = ?profile,
        clamped = ?clamped,
        "Inputs outside accepted ranges, clamping"
    );
    clamped
}

fn run_predict(
    pipeline: &RiskPipeline,
    config: &AppConfig,
    profile: CustomerProfile,
    format: OutputFormat,
    show_features: bool,
) -> Result<()> {
    let profile = clamp_profile(profile, &config.inputs);
    let assessment = pipeline.assess(&profile)?;

    println!("{}", render::render(&assessment, format)?);
    if show_features {
        println!("Features:\n{}", render::render_features(&pipeline.features(&profile)));
    }
    Ok(())
}

fn run_interactive(pipeline: &RiskPipeline, config: &AppConfig, format: OutputFormat) -> Result<()> {
    let metrics = SessionMetrics::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("Enter customer parameters as: <transaction count> <transaction amount> <revolving balance>");
    println!("Type 'quit' to exit.");

    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let profile = match line.parse::<CustomerProfile>() {
            Ok(profile) => clamp_profile(profile, &config.inputs),
            Err(e) => {
                println!("{}. Example: 60 4000 1000", e);
                continue;
            }
        };

        let start = Instant::now();
        match pipeline.assess(&profile) {
            Ok(assessment) => {
                metrics.record_assessment(start.elapsed(), assessment.tier);
                println!("{}\n", render::render(&assessment, format)?);
            }
            Err(e) => {
                metrics.record_failure();
                error!(error = %e, "Assessment failed");
                println!("Assessment failed: {}\n", e);
            }
        }
    }

    metrics.print_summary();
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    info!("Starting churn risk engine");
    info!(
        "Risk tiers: low<{:.2}, moderate<{:.2}, high>={:.2}",
        config.risk.moderate, config.risk.high, config.risk.high
    );

    let pipeline = match RiskPipeline::load(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(
                path = %config.artifact.path.display(),
                error = %e,
                "Model artifact unavailable, refusing predictions"
            );
            if e.is_artifact_error() {
                eprintln!("System Error: Model artifact not found. {}", e);
            } else {
                eprintln!("System Error: {}", e);
            }
            return Ok(ExitCode::from(2));
        }
    };

    match cli.command {
        Command::Predict {
            count,
            amount,
            balance,
            show_features,
        } => run_predict(
            &pipeline,
            &config,
            CustomerProfile::new(count, amount, balance),
            cli.format,
            show_features,
        )?,
        Command::Interactive => run_interactive(&pipeline, &config, cli.format)?,
        Command::Inspect => println!("{}", render::render_artifact(pipeline.artifact())),
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
