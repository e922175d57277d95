use std::path::Path;

use tempfile::TempDir;

pub mod macros;

/// Sets an environment variable for as long as the guard lives
pub struct EnvVarGuard(&'static str);

impl EnvVarGuard {
    pub fn new(var: &'static str, val: &str) -> Self {
        std::env::set_var(var, val);
        Self(var)
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        std::env::remove_var(self.0);
    }
}

/// A scratch directory removed when dropped, for anything that persists
/// state on disk during a test
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new(prefix: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("creating temp dir for test");
        log::debug!("Created test dir {}", dir.path().display());
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}
