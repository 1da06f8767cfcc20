use crate::error::{DocError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Settings shared by every tool call.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    root: PathBuf,
}

impl ServerConfig {
    /// Canonicalizes `root`, which must be an existing directory.
    pub fn new(root: &Path) -> Result<Self> {
        let root = fs::canonicalize(root).map_err(|err| {
            DocError::io(format!("document root {} is unusable", root.display()), err)
        })?;
        if !root.is_dir() {
            return Err(DocError::invalid_argument(format!(
                "document root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a caller-supplied path onto the document root. Relative paths
    /// are joined to the root; anything that lands outside it, lexically or
    /// through a symlink, is rejected.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf> {
        if raw.trim().is_empty() {
            return Err(DocError::invalid_argument("path must not be empty"));
        }
        let joined = self.root.join(raw);
        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.root) {
            return Err(escapes(raw));
        }

        let resolved = canonicalize_existing_prefix(&normalized);
        if !resolved.starts_with(&self.root) {
            return Err(escapes(raw));
        }
        Ok(resolved)
    }
}

fn escapes(raw: &str) -> DocError {
    DocError::invalid_argument(format!("path {raw} is outside the document root"))
}

/// Removes `.` and folds `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalizes the deepest ancestor that exists and re-attaches the rest,
/// so symlinks along the way are followed even for files not yet created.
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return rest
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn relative_paths_land_under_root() {
        let dir = tempdir().expect("tempdir");
        let config = ServerConfig::new(dir.path()).expect("config");
        let resolved = config.resolve("reports/q1.docx").expect("resolve");
        assert_eq!(resolved, config.root().join("reports").join("q1.docx"));

        let folded = config.resolve("a/../b.docx").expect("resolve");
        assert_eq!(folded, config.root().join("b.docx"));
    }

    #[test]
    fn absolute_path_inside_root_is_accepted() {
        let dir = tempdir().expect("tempdir");
        let config = ServerConfig::new(dir.path()).expect("config");
        let inside = config.root().join("x.docx");
        let resolved = config
            .resolve(inside.to_str().expect("utf8"))
            .expect("resolve");
        assert_eq!(resolved, inside);
    }

    #[test]
    fn escapes_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let config = ServerConfig::new(dir.path()).expect("config");
        for raw in ["../outside.docx", "a/../../outside.docx", "/etc/passwd", ""] {
            let err = config.resolve(raw).expect_err(raw);
            assert!(matches!(err, DocError::InvalidArgument(_)), "{raw}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_rejected() {
        let outside = tempdir().expect("outside");
        let dir = tempdir().expect("tempdir");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).expect("symlink");
        let config = ServerConfig::new(dir.path()).expect("config");
        let err = config.resolve("link/doc.docx").expect_err("escape");
        assert!(matches!(err, DocError::InvalidArgument(_)));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().expect("tempdir");
        assert!(ServerConfig::new(&dir.path().join("missing")).is_err());
    }
}
