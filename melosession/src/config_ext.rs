//! Session settings stored in meloconfig

use anyhow::Result;
use meloconfig::Config;
use std::path::PathBuf;

const DEFAULT_SESSION_FILE: &str = "session.json";

/// Extension trait adding session settings to `meloconfig::Config`
pub trait SessionConfigExt {
    /// Path of the persisted session file
    ///
    /// Relative paths are resolved against the configuration directory.
    fn get_session_file(&self) -> PathBuf;

    fn set_session_file(&self, path: &str) -> Result<()>;
}

impl SessionConfigExt for Config {
    fn get_session_file(&self) -> PathBuf {
        let file = self.get_string(&["session", "file"], DEFAULT_SESSION_FILE);
        self.resolve_path(&file)
    }

    fn set_session_file(&self, path: &str) -> Result<()> {
        self.set_string(&["session", "file"], path)
    }
}
