//! Inspect command implementation.

use super::{walk, Target};
use serde::Serialize;
use std::path::Path;

/// Container inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Container path.
    pub path: String,
    /// Driver used to open it.
    pub driver: String,
    /// Engine identifier of this open.
    pub id: u64,
    /// Size in bytes.
    pub size: u64,
    /// Lower compatibility bound stored in the container.
    pub libver_low: String,
    /// Upper compatibility bound stored in the container.
    pub libver_high: String,
    /// Number of groups below the root.
    pub group_count: usize,
    /// Group paths (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    target: &Target,
    show_groups: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, target, show_groups)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(
    path: &Path,
    target: &Target,
    show_groups: bool,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let file = target.open(path, "r", None)?;
    let bounds = file.stored_libver()?;

    let mut groups = Vec::new();
    walk(&file.root(), &mut groups)?;

    let result = InspectResult {
        path: file.filename().display().to_string(),
        driver: file.driver().to_string(),
        id: file.id().as_u64(),
        size: file.size()?,
        libver_low: bounds.low().to_string(),
        libver_high: bounds.high().to_string(),
        group_count: groups.len(),
        groups: show_groups.then_some(groups),
    };
    file.close()?;
    Ok(result)
}

fn print_text_output(result: &InspectResult) {
    println!("h5file Container Inspection");
    println!("===========================");
    println!();
    println!("Path:   {}", result.path);
    println!("Driver: {}", result.driver);
    println!("Size:   {}", format_size(result.size));
    println!();
    println!("Compatibility:");
    println!("  Low:  {}", result.libver_low);
    println!("  High: {}", result.libver_high);
    println!();
    println!("Groups: {}", result.group_count);

    if let Some(groups) = &result.groups {
        for group in groups {
            println!("  {group}");
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
