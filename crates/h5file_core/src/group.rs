//! Groups: named nodes in a container's hierarchy.

use crate::container::{Container, HandleRef};
use crate::error::{CoreError, CoreResult};
use std::fmt;

/// A group inside a container.
///
/// A group holds an uncounted reference to its container, so it never keeps
/// the container open on its own. [`Group::file`] returns the same container
/// every other alias refers to.
#[derive(Clone)]
pub struct Group {
    name: String,
    file: HandleRef,
}

/// Joins `name` onto `base`, giving an absolute path.
///
/// Absolute names ignore `base`. Empty names and `.`/`..` components are
/// rejected; repeated slashes collapse.
pub(crate) fn resolve_path(base: &str, name: &str) -> CoreResult<String> {
    let invalid = || CoreError::InvalidName {
        name: name.to_string(),
    };
    if name.is_empty() {
        return Err(invalid());
    }

    let mut parts: Vec<&str> = if name.starts_with('/') {
        Vec::new()
    } else {
        base.split('/').filter(|p| !p.is_empty()).collect()
    };
    for part in name.split('/') {
        match part {
            "" => {}
            "." | ".." => return Err(invalid()),
            part => parts.push(part),
        }
    }
    Ok(format!("/{}", parts.join("/")))
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

fn leaf_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, leaf)| leaf)
}

impl Group {
    pub(crate) fn root(file: HandleRef) -> Self {
        Self {
            name: "/".to_string(),
            file,
        }
    }

    /// Returns the absolute path of the group.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning container.
    #[must_use]
    pub fn file(&self) -> Container {
        self.file.owner()
    }

    /// Creates a child group. `name` may be relative or absolute.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Closed`] or [`CoreError::ReadOnly`] if the container
    ///   cannot be modified
    /// - [`CoreError::InvalidName`] for an unusable name
    /// - [`CoreError::GroupNotFound`] if the parent does not exist
    /// - [`CoreError::GroupExists`] if the group already exists
    pub fn create_group(&self, name: &str) -> CoreResult<Group> {
        let path = resolve_path(&self.name, name)?;
        self.file.shared().write(|engine| {
            let parent = parent_of(&path);
            if !engine.contains(parent) {
                return Err(CoreError::GroupNotFound {
                    path: parent.to_string(),
                });
            }
            if engine.contains(&path) || !engine.insert_group(&path) {
                return Err(CoreError::GroupExists { path: path.clone() });
            }
            Ok(())
        })?;
        tracing::debug!(group = %path, "created group");
        Ok(Self {
            name: path,
            file: self.file.clone(),
        })
    }

    /// Returns the child group `name`, creating it if it does not exist.
    ///
    /// Works on read-only containers as long as the group already exists.
    ///
    /// # Errors
    ///
    /// As [`Group::create_group`] when the group has to be created.
    pub fn require_group(&self, name: &str) -> CoreResult<Group> {
        let path = resolve_path(&self.name, name)?;
        if self.file.shared().read(|engine| engine.contains(&path))? {
            return Ok(Self {
                name: path,
                file: self.file.clone(),
            });
        }
        self.create_group(&path)
    }

    /// Opens an existing child group.
    ///
    /// # Errors
    ///
    /// [`CoreError::Closed`], [`CoreError::InvalidName`], or
    /// [`CoreError::GroupNotFound`].
    pub fn group(&self, name: &str) -> CoreResult<Group> {
        let path = resolve_path(&self.name, name)?;
        if !self.file.shared().read(|engine| engine.contains(&path))? {
            return Err(CoreError::GroupNotFound { path });
        }
        Ok(Self {
            name: path,
            file: self.file.clone(),
        })
    }

    /// Returns true if a group exists at `name`.
    ///
    /// Invalid names and closed containers report false.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let Ok(path) = resolve_path(&self.name, name) else {
            return false;
        };
        self.file
            .shared()
            .read(|engine| engine.contains(&path))
            .unwrap_or(false)
    }

    /// Returns the names of the direct children, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] on a closed container.
    pub fn members(&self) -> CoreResult<Vec<String>> {
        self.file.shared().read(|engine| {
            engine
                .catalog()
                .groups
                .iter()
                .filter(|path| parent_of(path) == self.name)
                .map(|path| leaf_of(path).to_string())
                .collect()
        })
    }

    /// Returns the number of direct children.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] on a closed container.
    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.members()?.len())
    }

    /// Returns true if the group has no children.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] on a closed container.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.file == other.file
    }
}

impl Eq for Group {}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_open() {
            write!(f, "<h5file group {:?}>", self.name)
        } else {
            f.write_str("<closed h5file group>")
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("file", &self.file)
            .finish()
    }
}
