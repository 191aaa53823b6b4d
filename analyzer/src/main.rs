//! @ai:module:intent CLI entry point for scanning sources against the module catalog
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on scan, catalog, output

use clap::{Parser, Subcommand, ValueEnum};
use modgrade_analyzer::{output, ModuleCatalog, OutputFormat, Scanner};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "modscan")]
#[command(author, version, about = "Scan C sources for internal module usage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalog matches and probe scores for a file or directory
    Scan {
        /// Path to file or directory to scan
        path: PathBuf,

        /// Module catalog file (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// List the modules of the catalog
    Catalog {
        /// Module catalog file (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn load_catalog(path: Option<&Path>) -> modgrade_analyzer::Result<ModuleCatalog> {
    match path {
        Some(path) => ModuleCatalog::load(path),
        None => ModuleCatalog::builtin(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            path,
            catalog,
            format,
        } => {
            let catalog = match load_catalog(catalog.as_deref()) {
                Ok(catalog) => catalog,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(1);
                }
            };

            match Scanner::new().scan_path(&path, &catalog) {
                Ok(summary) => {
                    println!("{}", output::format_scan_summary(&summary, format.into()));

                    if summary.passed() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(1)
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(2)
                }
            }
        }

        Commands::Catalog { catalog, format } => match load_catalog(catalog.as_deref()) {
            Ok(catalog) => {
                println!("{}", output::format_catalog(catalog.all(), format.into()));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(1)
            }
        },
    }
}
