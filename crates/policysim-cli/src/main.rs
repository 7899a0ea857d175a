//! PolicySim command-line front end
//!
//! # Usage
//! ```bash
//! policysim preview policy.toml
//! policysim simulate policy.toml --explain
//! policysim compare equal_pay.toml quota.toml
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use policysim_core::comparison::ComparisonOrchestrator;
use policysim_core::policy::advise;
use policysim_core::transport::report_file_name;
use policysim_core::{
    preview, validate, ChartSeries, ClientConfig, EngineTransport, HttpEngineClient, PolicyDraft,
    PolicyKind, SimulationFlow,
};
use tracing_subscriber::EnvFilter;

mod render;

/// PolicySim - simulate and compare gender-equality policies
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: policysim.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Simulation engine URL, overrides configuration and environment
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a policy draft and list every invalid field
    Validate {
        /// Policy draft (TOML)
        file: PathBuf,
    },

    /// Show the instant local pay gap estimate
    Preview {
        /// Policy draft (TOML)
        file: PathBuf,

        /// Baseline pay gap in percent (default from configuration)
        #[arg(long)]
        baseline: Option<f64>,

        /// Output the chart series as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show non-blocking hints about a policy
    Advise {
        /// Policy draft (TOML)
        file: PathBuf,
    },

    /// Run a simulation on the engine
    Simulate {
        /// Policy draft (TOML)
        file: PathBuf,

        /// Ask the engine for a plain-language explanation
        #[arg(long)]
        explain: bool,

        /// Output the normalized result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two policies side by side
    Compare {
        /// First policy draft (TOML)
        file_a: PathBuf,

        /// Second policy draft (TOML)
        file_b: PathBuf,

        /// Output the normalized comparison as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate a policy and download the engine's report
    Report {
        /// Policy draft (TOML)
        file: PathBuf,

        /// Output path (default: PolicySim_<name>_Report.pdf)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the engine's insights for a policy type
    Insights {
        /// Policy type (equal_pay, leadership_quota, parental_leave)
        policy_type: String,
    },

    /// Check that the engine is reachable
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Validate { file } => {
            let draft = load_draft(file)?;
            match validate(&draft) {
                Ok(policy) => render::print_valid(&policy),
                Err(errors) => {
                    render::print_validation_errors(&errors);
                    bail!("{} has {} invalid field(s)", file.display(), errors.len());
                }
            }
        }
        Commands::Preview {
            file,
            baseline,
            json,
        } => {
            let draft = load_draft(file)?;
            let baseline = match baseline {
                Some(gap) => *gap,
                None => load_config(&cli)?.baseline_gap,
            };
            let series = preview::estimate_with_baseline(&draft, baseline);
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ChartSeries::from_preview(&series))?
                );
            } else {
                render::print_preview(&draft, &series);
            }
        }
        Commands::Advise { file } => {
            let draft = load_draft(file)?;
            let policy = validate(&draft).map_err(|errors| {
                render::print_validation_errors(&errors);
                anyhow::anyhow!("{} is not a valid policy", file.display())
            })?;
            render::print_advisories(&policy, &advise(&policy));
        }
        Commands::Simulate {
            file,
            explain,
            json,
        } => {
            let draft = load_draft(file)?;
            let flow = SimulationFlow::new(engine(&cli)?);
            let Some(result) = render::settle(flow.run(&draft).await)? else {
                return Ok(());
            };
            let warnings = flow.controller().lock().warnings().to_vec();

            let explanation = if *explain {
                Some(
                    flow.transport()
                        .explain(&result)
                        .await
                        .map_err(|e| anyhow::anyhow!(e.user_message()))?,
                )
            } else {
                None
            };

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&render::SimulationOutput {
                        result: &result,
                        warnings: warnings.iter().map(ToString::to_string).collect(),
                        explanation: explanation.as_deref(),
                    })?
                );
            } else {
                render::print_result(&result);
                render::print_warnings(&warnings);
                if let Some(text) = explanation {
                    render::print_explanation(&text);
                }
            }
        }
        Commands::Compare {
            file_a,
            file_b,
            json,
        } => {
            let a = load_draft(file_a)?;
            let b = load_draft(file_b)?;
            let orchestrator = ComparisonOrchestrator::new(engine(&cli)?);
            let normalized = orchestrator
                .compare(&a, &b)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&render::ComparisonOutput {
                        result: &normalized.value,
                        warnings: normalized.warnings.iter().map(ToString::to_string).collect(),
                    })?
                );
            } else {
                render::print_comparison(&normalized.value);
                render::print_warnings(&normalized.warnings);
            }
        }
        Commands::Report { file, out } => {
            let draft = load_draft(file)?;
            let flow = SimulationFlow::new(engine(&cli)?);
            let Some(result) = render::settle(flow.run(&draft).await)? else {
                return Ok(());
            };

            let transport = flow.transport();
            let explanation = transport
                .explain(&result)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let bytes = transport
                .download_report(&result, &explanation)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            let path = out
                .clone()
                .unwrap_or_else(|| PathBuf::from(report_file_name(result.policy())));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report saved to {} ({} bytes)", path.display(), bytes.len());
        }
        Commands::Insights { policy_type } => {
            let kind: PolicyKind = policy_type.parse()?;
            let insights = engine(&cli)?
                .policy_insights(kind)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", serde_json::to_string_pretty(&insights)?);
        }
        Commands::Health => {
            let status = engine(&cli)?
                .health()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.clone());
        config.validate().context("Invalid --api-url")?;
    }
    Ok(config)
}

fn engine(cli: &Cli) -> anyhow::Result<Arc<dyn EngineTransport>> {
    let config = load_config(cli)?;
    tracing::debug!("Using simulation engine at {}", config.base_url);
    let client = HttpEngineClient::new(config).context("Failed to create engine client")?;
    Ok(Arc::new(client))
}

fn load_draft(path: &Path) -> anyhow::Result<PolicyDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy draft {}", path.display()))?;
    PolicyDraft::from_toml(&content)
        .with_context(|| format!("Failed to parse policy draft {}", path.display()))
}
