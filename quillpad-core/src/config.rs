//! # Config directory
//!
//! Every file that isn't a document lives in one per-user directory.

use std::path::{Path, PathBuf};

/// Name of the per-user directory under the platform preference dir.
pub const APP_DIR_NAME: &str = "quillpad";

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConfigDir {
    path: PathBuf,
}
impl ConfigDir {
    pub const SETTINGS: &'static str = "settings.bin";
    pub const LEGACY_SETTINGS: &'static str = "user_settings.bin";
    pub const PLATFORM_SETTINGS: &'static str = "platform_settings.bin";
    pub const LAST_CANVAS: &'static str = "saved_path";
    pub const DEFAULT_CANVAS: &'static str = "default_canvas.quill";

    /// The platform's per-user preferences directory, if it has one.
    #[must_use]
    pub fn preferences() -> Option<Self> {
        let mut path = dirs::preference_dir()?;
        path.push(APP_DIR_NAME);
        Some(Self { path })
    }
    /// Use an arbitrary directory.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
    /// Where the canvas is kept when the user never picked a file.
    #[must_use]
    pub fn default_canvas(&self) -> PathBuf {
        self.file(Self::DEFAULT_CANVAS)
    }
    /// Create the directory if it doesn't exist yet.
    /// # Errors
    /// Any I/O error besides the directory already existing.
    pub fn create(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.path)
    }
    /// Delete a file in the directory. A file that is already gone is not an error.
    /// # Errors
    /// Any I/O error besides the file not existing.
    pub fn delete(&self, name: &str) -> std::io::Result<()> {
        match std::fs::remove_file(self.file(name)) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
