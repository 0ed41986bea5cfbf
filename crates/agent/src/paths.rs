//! Path resolution for agent data files.
//!
//! Resolved once at startup from: CLI `--data-dir` > `XENEON_DATA_DIR` env > `~/.xeneon`,
//! then handed to the components that need it.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Priority: `explicit` arg > `XENEON_DATA_DIR` env > `~/.xeneon`.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let root = if let Some(p) = explicit {
            p.to_path_buf()
        } else if let Ok(env_val) = std::env::var("XENEON_DATA_DIR") {
            PathBuf::from(env_val)
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("HOME directory not found"))?
                .join(".xeneon")
        };
        Ok(Self { root })
    }

    #[cfg(test)]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Where enumeration dumps are written and removed again.
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join("scratch")
    }

    /// Bundled mixer utility, preferred over `svcl` on `PATH`.
    pub fn bundled_svcl(&self) -> PathBuf {
        self.root.join("bin").join("svcl.exe")
    }

    /// Create all required subdirectories under the data dir.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.log_dir())?;
        std::fs::create_dir_all(self.scratch_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let paths = DataPaths::resolve(Some(Path::new("/srv/xeneon"))).expect("resolve");
        assert_eq!(paths.root(), Path::new("/srv/xeneon"));
        assert_eq!(paths.bundled_svcl(), Path::new("/srv/xeneon/bin/svcl.exe"));
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let paths = DataPaths::new(tmp.path().join("data"));
        paths.ensure_dirs().expect("ensure dirs");
        assert!(paths.log_dir().is_dir());
        assert!(paths.scratch_dir().is_dir());
    }
}
