//! Mkgroup command implementation.

use super::Target;
use std::path::Path;

/// Runs the mkgroup command.
///
/// With `parents`, every missing ancestor is created and an existing group is
/// not an error.
pub fn run(
    path: &Path,
    target: &Target,
    name: &str,
    parents: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = target.open(path, "r+", None)?;
    let group = if parents {
        let mut group = file.root();
        for part in name.split('/').filter(|p| !p.is_empty()) {
            group = group.require_group(part)?;
        }
        group
    } else {
        file.create_group(name)?
    };
    println!("{}", group.name());
    file.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use h5file_core::Container;
    use tempfile::tempdir;

    #[test]
    fn creates_nested_with_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("g.h5");
        Container::open(&path, "w").unwrap().close().unwrap();

        assert!(run(&path, &Target::default(), "a/b/c", false).is_err());
        run(&path, &Target::default(), "a/b/c", true).unwrap();
        run(&path, &Target::default(), "a/b/c", true).unwrap();

        let file = Container::open(&path, "r").unwrap();
        assert!(file.contains("/a/b/c"));
    }

    #[test]
    fn requires_existing_container() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.h5");
        assert!(run(&path, &Target::default(), "a", false).is_err());
        assert!(!path.exists());
    }
}
