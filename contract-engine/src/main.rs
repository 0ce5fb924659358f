//! vibe-pack: assemble contracts and check jurisdiction packs from the shell
//!
//! Documents go to stdout, logs to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use clause_pack::{FsPackSource, LegalStance, PackSource, PackValidator, RiskLevel};
use contract_engine::{AssemblyError, AssemblyRequest, DocumentAssembler, EngineConfig};
use contract_polish::{PolishConfig, PolishProvider};

#[derive(Parser)]
#[command(name = "vibe-pack")]
#[command(about = "Assemble contracts from jurisdiction packs")]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "VIBE_PACK_CONFIG")]
    config: Option<PathBuf>,

    /// Pack root (overrides config file)
    #[arg(long, env = "VIBE_PACK_ROOT")]
    packs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate one jurisdiction pack, or all of them
    Validate {
        /// Jurisdiction code, or `all`
        #[arg(default_value = "all")]
        jurisdiction: String,
    },

    /// List jurisdictions and their contract types
    List,

    /// Assemble a contract
    Assemble {
        jurisdiction: String,
        contract_type: String,

        /// Placeholder value, `name=value`
        #[arg(short, long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,

        /// Variation override, `clause_id=variation`
        #[arg(short, long = "option", value_parser = parse_pair)]
        options: Vec<(String, String)>,

        /// Risk tolerance: low, medium, high
        #[arg(long, value_parser = parse_risk)]
        risk: Option<RiskLevel>,

        /// Legal stance: neutral, primary_favorable, counterparty_favorable
        #[arg(long, value_parser = parse_stance)]
        stance: Option<LegalStance>,

        /// Effective date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Polish the assembled text with the configured provider
        #[arg(long)]
        polish: bool,

        /// Polish provider (overrides config and environment)
        #[arg(long, value_parser = parse_provider)]
        provider: Option<PolishProvider>,

        /// Extra polish instructions
        #[arg(long, default_value = "")]
        requirements: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    if key.trim().is_empty() {
        return Err(format!("empty name in '{}'", raw));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn parse_risk(raw: &str) -> Result<RiskLevel, String> {
    RiskLevel::parse(raw).ok_or_else(|| format!("unknown risk level '{}'", raw))
}

fn parse_stance(raw: &str) -> Result<LegalStance, String> {
    LegalStance::parse(raw).ok_or_else(|| format!("unknown legal stance '{}'", raw))
}

fn parse_provider(raw: &str) -> Result<PolishProvider, String> {
    PolishProvider::parse(raw).ok_or_else(|| format!("unknown provider '{}'", raw))
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::from_yaml(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Some(root) = &cli.packs {
        config.packs.root = root.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("contract_engine=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    info!(packs = %config.packs.root.display(), "Using pack root");

    match cli.command {
        Command::Validate { jurisdiction } => {
            let source: Arc<dyn PackSource> = Arc::new(FsPackSource::new(config.packs.root.clone()));
            let validator = PackValidator::new(source);

            let reports = if jurisdiction == "all" {
                validator.validate_all().await?
            } else {
                vec![validator.validate(&jurisdiction).await?]
            };

            let mut failed = false;
            for report in &reports {
                println!("{}", report);
                failed |= !report.passed();
            }
            if failed {
                std::process::exit(1);
            }
        }

        Command::List => {
            let assembler = DocumentAssembler::from_config(&config)?;
            for jurisdiction in assembler.jurisdictions().await? {
                let types = assembler.contract_types(&jurisdiction).await?;
                println!("{}: {}", jurisdiction, types.join(", "));
            }
        }

        Command::Assemble {
            jurisdiction,
            contract_type,
            params,
            options,
            risk,
            stance,
            date,
            polish,
            provider,
            requirements,
            json,
        } => {
            if polish && config.polish.provider == PolishProvider::None {
                config.polish = PolishConfig::from_env();
            }
            if let Some(provider) = provider {
                config.polish.provider = provider;
            }

            let mut request = AssemblyRequest::new(jurisdiction, contract_type);
            request.parameters.extend(params);
            request.options.extend(options);
            if let Some(risk) = risk {
                request.preferences.risk_tolerance = risk;
            }
            if let Some(stance) = stance {
                request.preferences.legal_stance = stance;
            }
            request.effective_date = date;

            let assembler = DocumentAssembler::from_config(&config)?;
            let outcome = if polish {
                assembler.assemble_and_polish(&request, &requirements).await
            } else {
                assembler.assemble(&request).await
            };

            let result = match outcome {
                Ok(result) => result,
                Err(AssemblyError::Compliance { violations }) => {
                    eprintln!("Compliance check failed:");
                    for violation in &violations {
                        eprintln!("  - {}", violation);
                    }
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.text);
                for name in &result.missing_placeholders {
                    eprintln!("missing: {}", name);
                }
                for warning in &result.warnings {
                    eprintln!("warning: {}", warning);
                }
                for violation in &result.violations {
                    eprintln!("advisory: {}", violation);
                }
            }
        }
    }

    Ok(())
}
