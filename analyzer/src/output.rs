//! @ai:module:intent Format scan results and catalog listings (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_scan_summary, format_catalog
//! @ai:module:depends_on scan, catalog
//! @ai:module:stateless true

use crate::catalog::ModuleDefinition;
use crate::probe::ProbeReport;
use crate::scan::{ScanReport, ScanSummary};
use colored::Colorize;
use std::collections::{BTreeMap, BTreeSet};

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format scan results as a string
/// @ai:effects pure
pub fn format_scan_summary(summary: &ScanSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
        OutputFormat::Text => format_scan_summary_text(summary),
    }
}

/// @ai:intent Format scan results as human-readable text
/// @ai:effects pure
fn format_scan_summary_text(summary: &ScanSummary) -> String {
    let mut output = String::new();

    for report in &summary.reports {
        output.push_str(&format_scan_report_text(report));
        output.push('\n');
    }

    for failure in &summary.failures {
        output.push_str(&format!(
            "{} {} - {}\n",
            "ERROR".red().bold(),
            failure.path.display().to_string().dimmed(),
            failure.message
        ));
    }

    if summary.passed() {
        output.push_str(&format!(
            "{} Scanned {} files\n",
            "OK".green().bold(),
            summary.reports.len()
        ));
    } else {
        output.push_str(&format!(
            "Scanned {} files, {} failed\n",
            summary.reports.len(),
            summary.failures.len().to_string().red().bold()
        ));
    }

    output
}

fn format_scan_report_text(report: &ScanReport) -> String {
    let mut output = String::new();
    let matches = &report.matches;

    output.push_str(&format!(
        "{} ({})\n",
        report.path.display().to_string().bold(),
        report.language
    ));

    if matches.modules_included.is_empty() {
        output.push_str(&format!("  Modules: {}\n", "none".dimmed()));
    } else {
        output.push_str(&format!("  Modules ({}):\n", matches.modules_included.len()));
        for module in &matches.modules_included {
            output.push_str(&format!("    {}\n", module.cyan()));
            push_names(&mut output, "functions", &matches.functions_used, module);
            push_names(&mut output, "types", &matches.types_used, module);
            push_names(&mut output, "constants", &matches.constants_used, module);
        }
    }

    for (module, names) in &matches.unincluded_usage {
        output.push_str(&format!(
            "  {} {} used without including its header: {}\n",
            "warn:".yellow().bold(),
            module.cyan(),
            join(names)
        ));
    }

    push_probe(&mut output, "Architecture", &report.architecture);
    push_probe(&mut output, "Error handling", &report.error_handling);

    output
}

fn push_names(
    output: &mut String,
    label: &str,
    map: &BTreeMap<String, BTreeSet<String>>,
    module: &str,
) {
    if let Some(names) = map.get(module) {
        output.push_str(&format!("      {}: {}\n", label.dimmed(), join(names)));
    }
}

fn push_probe(output: &mut String, label: &str, report: &ProbeReport) {
    let score = format!("{:.1}/10", report.score);
    let score = if report.score >= 6.0 {
        score.green()
    } else if report.score >= 3.0 {
        score.yellow()
    } else {
        score.red()
    };

    output.push_str(&format!("  {}: {}\n", label, score));
    for finding in &report.findings {
        output.push_str(&format!("    - {}\n", finding));
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// @ai:intent Format a catalog listing as a string
/// @ai:effects pure
pub fn format_catalog(modules: &[ModuleDefinition], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(modules).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(modules).unwrap_or_default(),
        OutputFormat::Text => format_catalog_text(modules),
    }
}

/// @ai:intent Format a catalog listing as human-readable text
/// @ai:effects pure
fn format_catalog_text(modules: &[ModuleDefinition]) -> String {
    let mut output = String::new();

    for module in modules {
        output.push_str(&format!(
            "{} {}\n",
            module.id.cyan().bold(),
            module.header_path.dimmed()
        ));
        output.push_str(&format!(
            "    {} functions, {} types, {} constants\n",
            module.functions.len(),
            module.types.len(),
            module.constants.len()
        ));
    }

    output.push_str(&format!("\n{} modules\n", modules.len()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleCatalog;
    use crate::language::Language;
    use crate::scan::Scanner;
    use std::path::Path;

    fn summary() -> ScanSummary {
        let catalog = ModuleCatalog::builtin().unwrap();
        let report = Scanner::new().scan_text(
            Path::new("blink.c"),
            Language::C,
            "#include \"xgpio_hal.h\"\nint main(void) { xgpio_init_pin(1, 1, NULL); xspi_init(); }\n",
            &catalog,
        );
        ScanSummary {
            reports: vec![report],
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_text_output_lists_modules_and_warnings() {
        colored::control::set_override(false);
        let text = format_scan_summary(&summary(), OutputFormat::Text);

        assert!(text.contains("blink.c (c)"));
        assert!(text.contains("xgpio_hal"));
        assert!(text.contains("functions: xgpio_init_pin"));
        assert!(text.contains("xspi_hal used without including its header: xspi_init"));
        assert!(text.contains("Scanned 1 files"));
    }

    #[test]
    fn test_json_output_is_parseable() {
        let json = format_scan_summary(&summary(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["reports"][0]["language"], "c");
        assert_eq!(
            value["reports"][0]["matches"]["modules_included"][0],
            "xgpio_hal"
        );
    }

    #[test]
    fn test_catalog_listing() {
        colored::control::set_override(false);
        let catalog = ModuleCatalog::builtin().unwrap();
        let text = format_catalog(catalog.all(), OutputFormat::Text);

        assert!(text.contains("xcrypto_engine"));
        assert!(text.contains("19 modules"));
    }
}
