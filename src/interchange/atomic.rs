//! Atomic file replacement and soft reads.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::interchange::InterchangeError;

/// Sibling temp path: `<name>.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `contents` so readers see either the old or the new
/// file, never a partial one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), InterchangeError> {
    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(|e| InterchangeError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        InterchangeError::io(path, e)
    })
}

/// File contents, or `None` if it cannot be read.
pub fn read_soft(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// Trimmed contents, or `None` if unreadable or blank.
pub fn read_trimmed(path: &Path) -> Option<String> {
    let text = read_soft(path)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_dir {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Unique scratch directory, removed on drop.
    pub struct TestDir(PathBuf);

    impl TestDir {
        pub fn new(tag: &str) -> Self {
            let n = COUNTER.fetch_add(1, Ordering::SeqCst);
            let path = std::env::temp_dir().join(format!(
                "sweepbot-{}-{}-{}",
                tag,
                std::process::id(),
                n
            ));
            let _ = std::fs::remove_dir_all(&path);
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        pub fn path(&self) -> &Path {
            &self.0
        }

        pub fn join(&self, name: &str) -> PathBuf {
            self.0.join(name)
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
