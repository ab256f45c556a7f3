//! Per-render temporary directories.

use std::fs;
use std::io;
use std::path::Path;

use tempfile::TempDir;

const PREFIX: &str = "texifier-";

/// A uniquely named directory that is removed, with everything in it, when dropped.
///
/// Every render owns exactly one; concurrent renders never share a directory.
#[derive(Debug)]
pub struct WorkingArea {
    dir: Option<TempDir>,
}

impl WorkingArea {
    /// Create a fresh area under `root`, or under the system temp dir.
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        log::debug!("working area {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        self.dir.as_ref().map_or(Path::new(""), TempDir::path)
    }
}

impl Drop for WorkingArea {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => log::trace!("removed working area {}", path.display()),
            Err(err) => log::warn!("failed to remove working area {}: {err}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_on_drop_with_contents() {
        let root = tempfile::tempdir().unwrap();
        let area = WorkingArea::create(Some(root.path())).unwrap();
        let path = area.path().to_path_buf();
        fs::write(path.join("preview.tex"), "x").unwrap();
        fs::create_dir(path.join("nested")).unwrap();
        fs::write(path.join("nested/out.aux"), "y").unwrap();

        assert!(path.starts_with(root.path()));
        drop(area);
        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn areas_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = WorkingArea::create(Some(root.path())).unwrap();
        let b = WorkingArea::create(Some(root.path())).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn missing_root_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b");
        let area = WorkingArea::create(Some(&nested)).unwrap();
        assert!(area.path().starts_with(&nested));
    }
}
