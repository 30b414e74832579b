//! Local workspace for files handed back to the calling pipeline

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Directory all output files are written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a new workspace rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace in the current directory
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a workspace-relative path.
    ///
    /// Rejects paths that would leave the workspace.
    pub fn path(&self, relative: impl AsRef<Path>) -> io::Result<PathBuf> {
        let relative = relative.as_ref();
        let escapes = relative.components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path '{}' leaves the workspace", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Write a file, creating parent directories as needed
    pub fn write_file(&self, relative: impl AsRef<Path>, content: &[u8]) -> io::Result<PathBuf> {
        let path = self.path(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Serialize a value as pretty JSON into a workspace file
    pub fn write_json<T: serde::Serialize>(&self, relative: impl AsRef<Path>, value: &T) -> io::Result<PathBuf> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write_file(relative, &json)
    }

    /// Read a workspace file
    pub fn read_file(&self, relative: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        fs::read(self.path(relative)?)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::current_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());

        let path = ws.write_file("sbom/repo-1/bom.xml", b"<bom/>").unwrap();
        assert!(path.ends_with("sbom/repo-1/bom.xml"));
        assert_eq!(ws.read_file("sbom/repo-1/bom.xml").unwrap(), b"<bom/>");
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());

        assert!(ws.write_file("../outside.txt", b"x").is_err());
        assert!(ws.path("/etc/passwd").is_err());
    }

    #[test]
    fn test_file_name_with_spaces() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());

        ws.write_file("Failed xmake jobs - error details.html", b"<html/>").unwrap();
        assert!(dir.path().join("Failed xmake jobs - error details.html").exists());
    }
}
