//! Create command implementation.

use super::{parse_libver, Target};
use h5file_core::Mode;
use std::path::Path;

/// Runs the create command.
///
/// Modes that only open existing containers are refused before anything is
/// touched.
pub fn run(
    path: &Path,
    target: &Target,
    mode: &str,
    libver: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !Mode::resolve(mode)?.may_create() {
        return Err(format!("mode {mode:?} never creates a container").into());
    }

    let file = target.open(path, mode, libver.map(parse_libver))?;
    println!(
        "Created {} (mode {}, driver {}, libver {})",
        file.filename().display(),
        file.open_mode(),
        file.driver(),
        file.libver()
    );
    file.close()?;
    Ok(())
}
