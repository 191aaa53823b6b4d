//! @ai:module:intent Discover tool submissions laid out as <tools_dir>/<tool>/<scenario>.<ext>
//! @ai:module:layer infrastructure
//! @ai:module:public_api discover_submissions
//! @ai:module:stateless true

use crate::batch::types::Submission;
use anyhow::{Context, Result};
use modgrade_analyzer::is_supported_file;
use std::path::Path;
use walkdir::WalkDir;

/// @ai:intent Collect one submission per supported source file, sorted by tool then file name
/// @ai:pre tools_dir is a directory
/// @ai:post the file stem is the scenario id and the parent directory is the tool id
/// @ai:effects fs:read
pub fn discover_submissions(tools_dir: &Path) -> Result<Vec<Submission>> {
    if !tools_dir.is_dir() {
        anyhow::bail!("Not a directory: {}", tools_dir.display());
    }

    let mut submissions = Vec::new();

    for entry in WalkDir::new(tools_dir)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
    {
        let entry = entry
            .with_context(|| format!("Failed to walk submissions in {}", tools_dir.display()))?;
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        if !is_supported_file(path) {
            tracing::warn!("Skipping unsupported file: {}", path.display());
            continue;
        }

        let tool_id = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());
        let scenario_id = path.file_stem().and_then(|s| s.to_str());

        match (tool_id, scenario_id) {
            (Some(tool_id), Some(scenario_id)) => {
                submissions.push(Submission::from_file(tool_id, scenario_id, path));
            }
            _ => tracing::warn!("Skipping file with a non UTF-8 name: {}", path.display()),
        }
    }

    tracing::info!(
        "Discovered {} submissions in {}",
        submissions.len(),
        tools_dir.display()
    );

    Ok(submissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_tool_scenario_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        for (tool, file) in [
            ("bravo", "basic_gpio.c"),
            ("alpha", "motor_control.cpp"),
            ("alpha", "basic_gpio.c"),
            ("alpha", "notes.txt"),
        ] {
            std::fs::create_dir_all(root.join(tool)).unwrap();
            std::fs::write(root.join(tool).join(file), "int main(void) { return 0; }\n").unwrap();
        }
        std::fs::write(root.join("top_level.c"), "").unwrap();

        let found: Vec<(String, String)> = discover_submissions(root)
            .unwrap()
            .into_iter()
            .map(|s| (s.tool_id, s.scenario_id))
            .collect();

        assert_eq!(
            found,
            vec![
                ("alpha".to_string(), "basic_gpio".to_string()),
                ("alpha".to_string(), "motor_control".to_string()),
                ("bravo".to_string(), "basic_gpio".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(discover_submissions(&temp.path().join("absent")).is_err());
    }
}
