use std::io;
use std::path::{Component, Path, PathBuf};

/// Ordered list of directories consulted when resolving a module by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut path = Self::new();
        for entry in entries {
            path.append(entry);
        }
        path
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.entries.iter().any(|entry| entry == dir)
    }

    /// Put `dir` at the front; an existing occurrence is moved rather than duplicated.
    pub fn prepend<P>(&mut self, dir: P)
    where
        P: Into<PathBuf>,
    {
        let dir = dir.into();
        self.entries.retain(|entry| *entry != dir);
        self.entries.insert(0, dir);
    }

    pub fn append<P>(&mut self, dir: P)
    where
        P: Into<PathBuf>,
    {
        let dir = dir.into();
        if !self.contains(&dir) {
            self.entries.push(dir);
        }
    }

    /// Prepend the directory one level above `location`'s own directory, so modules living next
    /// to the adapter's directory resolve regardless of the working directory. Returns the
    /// directory that was inserted.
    pub fn prepend_parent_of(&mut self, location: &Path) -> io::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        let root = adapter_root(location, &cwd)?;
        log::debug!(
            "prepending {} to module search path (adapter at {})",
            root.display(),
            location.display()
        );
        self.prepend(root.clone());
        Ok(root)
    }

    /// First `dir/file_name` that exists, in search order.
    pub fn find_file(&self, file_name: &str) -> Option<PathBuf> {
        self.entries
            .iter()
            .map(|entry| entry.join(file_name))
            .find(|candidate| candidate.is_file())
    }
}

/// `dirname(dirname(abspath(location)))`, with relative locations anchored at `cwd`. Like
/// `dirname`, stepping above the filesystem root stays at the root.
pub(crate) fn adapter_root(location: &Path, cwd: &Path) -> io::Result<PathBuf> {
    let absolute = if location.is_absolute() {
        normalize(location)
    } else {
        normalize(&cwd.join(location))
    };

    let dir = absolute.parent().unwrap_or(&absolute);
    let root = dir.parent().unwrap_or(dir);
    if !root.has_root() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "adapter location {} does not resolve to an absolute path",
                location.display()
            ),
        ));
    }
    Ok(root.to_path_buf())
}

/// Lexically collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
