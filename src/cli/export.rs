// src/cli/export.rs — Suite format conversion
//
// Reads a generated suite from JSON and re-renders it as CSV, JSON, or YAML.

use crate::core::suite::TestSuite;
use crate::export;

/// Handle the `caseforge export` command.
pub fn run_export(input: &str, format: &str, output: Option<&str>) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(input)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let suite = TestSuite::from_value(value);

    let rendered = match format {
        "json" => {
            let mut text = serde_json::to_string_pretty(&suite.to_value())?;
            text.push('\n');
            text
        }
        "yaml" | "yml" => serde_yml::to_string(&suite.to_value())?,
        "csv" => export::to_csv(&export::flatten(&suite)),
        other => {
            anyhow::bail!("Unknown format '{}'. Options: csv, json, yaml", other);
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("Exported {} to {}", input, path);
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
