//! CLI command implementations.

pub mod create;
pub mod inspect;
pub mod ls;
pub mod mkgroup;

use h5file_core::{open, Container, CoreResult, DriverOption, DriverOptions, Group, Libver};
use std::path::Path;

/// Driver selection shared by every command.
#[derive(Debug, Default)]
pub struct Target {
    driver: Option<String>,
    options: DriverOptions,
}

impl Target {
    /// Parses `KEY=VALUE` driver options.
    pub fn new(driver: Option<String>, raw: &[String]) -> Result<Self, String> {
        let mut options = DriverOptions::new();
        for item in raw {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| format!("driver option {item:?} is not KEY=VALUE"))?;
            options.insert(key.trim(), DriverOption::parse(value.trim()));
        }
        Ok(Self { driver, options })
    }

    /// Opens `path` with this driver selection.
    pub fn open(&self, path: &Path, mode: &str, libver: Option<Libver<'_>>) -> CoreResult<Container> {
        open(path, mode, self.driver.as_deref(), &self.options, libver)
    }
}

/// Parses `TAG` or `LOW,HIGH`.
pub fn parse_libver(raw: &str) -> Libver<'_> {
    match raw.split_once(',') {
        Some((low, high)) => Libver::Pair(low.trim(), high.trim()),
        None => Libver::Single(raw.trim()),
    }
}

/// Collects the absolute paths of every group below `group`, depth first.
pub fn walk(group: &Group, out: &mut Vec<String>) -> CoreResult<()> {
    for name in group.members()? {
        let child = group.group(&name)?;
        out.push(child.name().to_string());
        walk(&child, out)?;
    }
    Ok(())
}
