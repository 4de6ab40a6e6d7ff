//! Ls command implementation.

use super::{walk, Target};
use std::path::Path;

/// Runs the ls command.
pub fn run(
    path: &Path,
    target: &Target,
    group: &str,
    recursive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for line in list(path, target, group, recursive)? {
        println!("{line}");
    }
    Ok(())
}

fn list(
    path: &Path,
    target: &Target,
    group: &str,
    recursive: bool,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let file = target.open(path, "r", None)?;
    let group = file.group(group)?;
    let lines = if recursive {
        let mut paths = Vec::new();
        walk(&group, &mut paths)?;
        paths
    } else {
        group.members()?
    };
    file.close()?;
    Ok(lines)
}
