//! The file-transfer half of a remote host.

use crate::error::Result;

/// File operations performed with the login user's own identity.
///
/// Anything needing elevated rights goes through [`crate::Session`]
/// instead, since the login user may not own the target paths.
pub trait FileChannel {
    /// Whether `path` exists.
    ///
    /// A missing path is `Ok(false)`. Any other stat failure is an error.
    fn exists(&self, path: &str) -> Result<bool>;

    /// Create a single directory.
    fn mkdir(&self, path: &str) -> Result<()>;

    /// Create or truncate `path` and write `content` to it.
    fn write(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Create `path` if it does not exist yet.
    fn ensure_dir(&self, path: &str) -> Result<()> {
        if !self.exists(path)? {
            log::debug!("creating remote directory {}", path);
            self.mkdir(path)?;
        }
        Ok(())
    }
}
