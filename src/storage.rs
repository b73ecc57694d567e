use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::DEFAULT_UPLOAD_SUBDIR;
use crate::sanitize::{sanitize, sanitize_segments};

/// rwxr-xr-x
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Base directory for all project data, fixed once at startup.
#[derive(Clone, Debug)]
pub struct UploadRoot {
    root: PathBuf,
}

impl UploadRoot {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolves the root from the running executable and an optional override.
    ///
    /// The executable path is looked up even when an override is present, so a
    /// process that cannot locate itself never starts.
    pub fn from_process(override_dir: Option<&str>) -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(Self::resolve(&exe, override_dir)))
    }

    /// Picks the override verbatim when set, otherwise `<exe dir>/uploads`.
    pub fn resolve(exe: &Path, override_dir: Option<&str>) -> PathBuf {
        match override_dir.filter(|value| !value.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => exe
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_UPLOAD_SUBDIR),
        }
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        create_dir_tree(&self.root).await
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// `root/<proj>/<dir>` with both components sanitized independently.
    pub fn project_dir(&self, proj: &str, dir: &str) -> PathBuf {
        self.root.join(sanitize(proj)).join(sanitize(dir))
    }

    /// Maps a `/latest` query path below the root, one sanitized segment at a time.
    pub fn query_dir(&self, path: &str) -> PathBuf {
        let mut target = self.root.clone();
        target.extend(sanitize_segments(path));
        target
    }
}

/// Recursive `mkdir -p` with the shared directory permissions.
pub async fn create_dir_tree(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(path).await
}
