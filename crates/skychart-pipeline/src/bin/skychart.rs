use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use skychart_ai::PromptTemplateEngine;
use skychart_core::{BirthData, BirthDataNormalizer, ConfigManager, CoreError};
use skychart_parser::PositionParser;
use skychart_pipeline::{logging, PipelineOrchestrator};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "skychart")]
#[command(about = "SkyChart - natal chart and life-mission analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty)
    #[arg(short, long, global = true, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full two-stage analysis for one subject
    Generate {
        /// Birth data JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Write the analysis JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Explicit TOML config file
        #[arg(short, long, env = "SKYCHART_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Extract positions from chart-stage text
    Parse {
        /// Chart text file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the chart-stage prompt for a subject
    Prompt {
        /// Birth data JSON file
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match execute_command(&cli).await {
        Ok(Some(output)) => {
            print_output(&cli.format, &output)?;
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<Option<serde_json::Value>> {
    match &cli.command {
        Commands::Generate {
            input,
            output,
            config,
        } => execute_generate(input, output.as_deref(), config.as_deref()).await,
        Commands::Parse { input } => execute_parse(input).map(Some),
        Commands::Prompt { input } => {
            let birth = BirthDataNormalizer::normalize(&read_birth_data(input)?)?;
            println!("{}", PromptTemplateEngine::render_chart_prompt(&birth));
            Ok(None)
        }
    }
}

async fn execute_generate(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<Option<serde_json::Value>> {
    let manager = match config_path {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    let config = manager.config();

    if let Err(e) = logging::init_tracing(&config.logging) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    if config.llm.api_key.is_none() {
        return Err(CoreError::ConfigurationMissing(
            "set SKYCHART_API_KEY or OPENAI_API_KEY".to_string(),
        )
        .into());
    }

    let birth = read_birth_data(input)?;
    let orchestrator =
        PipelineOrchestrator::from_config(config).context("Failed to build pipeline")?;
    let result = orchestrator
        .generate(birth)
        .await
        .context("Analysis failed")?;

    let value = serde_json::to_value(&result)?;
    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} {} ({} positions, {} tokens)",
                "Saved".green().bold(),
                path.display(),
                result.chart.positions.len(),
                result.metadata.tokens_used
            );
            Ok(None)
        }
        None => Ok(Some(value)),
    }
}

fn execute_parse(input: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok(serde_json::to_value(PositionParser::parse(&text))?)
}

fn read_birth_data(path: &Path) -> Result<BirthData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid birth data in {}", path.display()))
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value, 0)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}{}: {}", indent, key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}{}: {}", indent, key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}{}: {}", indent, key_colored, val_colored);
                    }
                    serde_json::Value::Null => {
                        println!("{}{}: {}", indent, key_colored, "null".dimmed());
                    }
                    nested => {
                        println!("{}{}:", indent, key_colored);
                        print_pretty(nested, depth + 1)?;
                    }
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("{}{}{}:", indent, "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item, depth + 1)?;
            }
        }
        _ => {
            println!("{}{}", indent, value);
        }
    }
    Ok(())
}
