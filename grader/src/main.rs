//! @ai:module:intent CLI for scenario grading and batch tool comparison
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modgrade::{
    batch::{discover_submissions, BatchAggregator, BatchReport, Submission},
    config::GraderConfig,
    evaluator::{ScenarioEvaluator, ScenarioEvaluatorTrait, ScoredResult},
    report::{BatchRecord, EvaluationRecord, ReportGenerator},
    rubric::{Category, RubricSet},
};
use modgrade_analyzer::ModuleCatalog;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "modgrade.toml";

#[derive(Parser)]
#[command(name = "modgrade")]
#[command(about = "Grade generated embedded C code against internal module scenarios")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one source file against a scenario
    Evaluate {
        /// Scenario identifier (e.g. basic_gpio)
        scenario: String,

        /// Source file to evaluate
        file: PathBuf,

        /// Write the evaluation record as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a Markdown evaluation report
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Evaluate every tool directory and compare the tools
    Batch {
        /// Directory laid out as <tool>/<scenario>.<ext>
        tools_dir: PathBuf,

        /// Parent directory for the timestamped results directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of concurrent evaluations
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Re-render the Markdown report from a saved batch results file
    Report {
        /// Path to results JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Output directory for the report (defaults to the results directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List scenario rubrics
    Scenarios,

    /// Validate the module catalog and scenario rubrics
    Validate,

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("modgrade=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            scenario,
            file,
            output,
            report,
        } => evaluate_file(cli.config, &scenario, &file, output, report),
        Commands::Batch {
            tools_dir,
            output,
            workers,
        } => run_batch(cli.config, &tools_dir, output, workers).await,
        Commands::Report { results, output } => generate_reports(results, output),
        Commands::Scenarios => list_scenarios(cli.config),
        Commands::Validate => validate(cli.config),
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Load configuration from the given path, ./modgrade.toml, or defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<GraderConfig> {
    match path {
        Some(p) => GraderConfig::load(&p),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);

            if default_path.exists() {
                GraderConfig::load(&default_path)
            } else {
                Ok(GraderConfig::default())
            }
        }
    }
}

/// @ai:intent Load the catalog and rubrics named by the configuration
/// @ai:effects fs:read
fn load_definitions(config: &GraderConfig) -> Result<(Arc<ModuleCatalog>, Arc<RubricSet>)> {
    let catalog = match &config.paths.catalog {
        Some(path) => ModuleCatalog::load(path)
            .with_context(|| format!("Failed to load module catalog: {}", path.display()))?,
        None => ModuleCatalog::builtin().context("Failed to load built-in module catalog")?,
    };

    let rubrics = match &config.paths.scenarios {
        Some(path) => RubricSet::load(path, &catalog)
            .with_context(|| format!("Failed to load scenarios: {}", path.display()))?,
        None => RubricSet::builtin(&catalog).context("Failed to load built-in scenarios")?,
    };

    tracing::info!(
        "Loaded {} modules and {} scenarios",
        catalog.len(),
        rubrics.len()
    );

    Ok((Arc::new(catalog), Arc::new(rubrics)))
}

/// @ai:intent Build an evaluator from configuration
/// @ai:effects fs:read
fn build_evaluator(config: &GraderConfig) -> Result<ScenarioEvaluator> {
    let (catalog, rubrics) = load_definitions(config)?;

    Ok(ScenarioEvaluator::with_config(
        catalog,
        rubrics,
        config.scoring.clone(),
        config.limits.clone(),
    ))
}

/// @ai:intent Evaluate one file and optionally write its reports
/// @ai:effects fs:read, fs:write
fn evaluate_file(
    config_path: Option<PathBuf>,
    scenario: &str,
    file: &Path,
    json_output: Option<PathBuf>,
    markdown_output: Option<PathBuf>,
) -> Result<()> {
    let config = load_or_default_config(config_path)?;
    let evaluator = build_evaluator(&config)?;

    let submission_id = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("submission")
        .to_string();
    let source = Submission::from_file(&submission_id, scenario, file)
        .load(config.limits.max_source_bytes)?;

    let result = evaluator
        .evaluate(&submission_id, &source, scenario)
        .with_context(|| format!("Failed to evaluate {}", file.display()))?;

    print_evaluation(&result);

    let record = EvaluationRecord::from_result(&result);
    ReportGenerator::new().write_evaluation(
        &record,
        json_output.as_deref(),
        markdown_output.as_deref(),
    )?;

    Ok(())
}

/// @ai:intent Discover submissions, run the batch and write its reports
/// @ai:effects fs:read, fs:write
async fn run_batch(
    config_path: Option<PathBuf>,
    tools_dir: &Path,
    output: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = load_or_default_config(config_path)?;
    if let Some(workers) = workers {
        config.batch.workers = workers;
    }
    config.validate()?;

    let submissions = discover_submissions(tools_dir)?;
    if submissions.is_empty() {
        tracing::warn!("No submissions found in {}", tools_dir.display());
        return Ok(());
    }

    let evaluator = Arc::new(build_evaluator(&config)?);
    let aggregator = BatchAggregator::with_config(evaluator, &config.batch, &config.limits);
    let report = aggregator.run(submissions).await;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let output_dir = output
        .unwrap_or_else(|| config.paths.results_dir.clone())
        .join(timestamp.to_string());

    ReportGenerator::new().generate_all(&BatchRecord::from_report(&report), &output_dir)?;

    print_batch_summary(&report);
    println!("Results written to {}", output_dir.display());

    Ok(())
}

/// @ai:intent Re-render the Markdown report from a results file
/// @ai:effects fs:read, fs:write
fn generate_reports(results_path: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let record = BatchRecord::load(&results_path)?;
    let output_dir = output_dir.unwrap_or_else(|| {
        results_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    ReportGenerator::new().generate_markdown(&record, &output_dir)?;

    println!("Report generated in {}", output_dir.display());
    Ok(())
}

/// @ai:intent List scenario rubrics
/// @ai:effects fs:read
fn list_scenarios(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config_path)?;
    let (_, rubrics) = load_definitions(&config)?;

    println!("Available scenarios ({}):", rubrics.len());
    println!();
    println!(
        "{:<20} {:<20} {:>7} {:>7} {:>7} {:>7}",
        "ID", "Title", "Module", "Func", "Arch", "Error"
    );
    println!("{}", "-".repeat(72));

    for rubric in rubrics.all() {
        let w = &rubric.weights;
        println!(
            "{:<20} {:<20} {:>6.0}% {:>6.0}% {:>6.0}% {:>6.0}%",
            rubric.id,
            rubric.display_title(),
            w.module_usage * 100.0,
            w.function_correctness * 100.0,
            w.architecture * 100.0,
            w.error_handling * 100.0
        );
        println!("  required: {}", rubric.required_modules.join(", "));
    }

    Ok(())
}

/// @ai:intent Validate catalog and rubrics can be loaded
/// @ai:effects fs:read
fn validate(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config_path)?;
    let (catalog, rubrics) = load_definitions(&config)?;

    println!("Validation passed!");
    println!("Modules: {}", catalog.len());
    println!("Scenarios: {}", rubrics.len());

    for rubric in rubrics.all() {
        println!("  - {} ({} checks)", rubric.id, rubric.checks.len());
    }

    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = GraderConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Print a single evaluation to the console
/// @ai:effects io
fn print_evaluation(result: &ScoredResult) {
    println!();
    println!(
        "Evaluation: {} / {}",
        result.submission_id(),
        result.scenario_id()
    );
    println!("{}", "=".repeat(50));

    for category in Category::ALL {
        println!(
            "{:<25} {:>6.1}/10",
            format!("{}:", category.title()),
            result.category_score(category)
        );
    }
    println!("{}", "-".repeat(50));
    println!(
        "{:<25} {:>6.1}/10  {}",
        "Total:",
        result.total_score(),
        if result.passed() { "PASS" } else { "FAIL" }
    );

    if !result.recommendations().is_empty() {
        println!();
        println!("Recommendations:");
        for recommendation in result.recommendations() {
            println!("  - {}", recommendation);
        }
    }
    println!();
}

/// @ai:intent Print the batch ranking to the console
/// @ai:effects io
fn print_batch_summary(report: &BatchReport) {
    println!();
    println!("Tool Ranking");
    println!("============");
    println!();
    println!(
        "{:<5} {:<25} {:>6} {:>8} {:>8} {:>8}",
        "Rank", "Tool", "Mean", "StdDev", "Scored", "Failed"
    );
    println!("{}", "-".repeat(65));

    for (rank, tool) in report.ranking.iter().enumerate() {
        let Some(stats) = report.tool_stats.get(tool) else {
            continue;
        };
        println!(
            "{:<5} {:<25} {:>6.1} {:>8.2} {:>8} {:>8}",
            rank + 1,
            tool,
            stats.mean,
            stats.stdev,
            stats.scored,
            stats.failed
        );
    }

    let failed = report.failed_entries().count();
    if failed > 0 {
        println!();
        println!("{} submissions could not be evaluated:", failed);
        for entry in report.failed_entries() {
            println!(
                "  {} / {}: {}",
                entry.tool_id,
                entry.result.scenario_id(),
                entry.result.failure().unwrap_or("unknown failure")
            );
        }
    }
    println!();
}
