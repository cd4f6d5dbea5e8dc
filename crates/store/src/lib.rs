use std::fs;
use std::path::PathBuf;

use core_lib::AuthError;

#[async_trait::async_trait]
pub trait CredentialStore {
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError>;
    async fn persist(&self, key: &str, value: &str) -> Result<(), AuthError>;
}

/// Durable key-value store backed by a `KEY=VALUE` text file, the same
/// file the configuration loader reads at process start.
///
/// No locking: concurrent writers must serialize access externally.
pub struct EnvFileStore {
    pub path: PathBuf,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EnvFileStore { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CredentialStore for EnvFileStore {
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            AuthError::ConfigError(format!("reading {} failed: {e}", self.path.display()))
        })?;

        for line in contents.lines() {
            if let Some((name, value)) = line.split_once('=') {
                if name == key {
                    return Ok(Some(value.to_string()));
                }
            }
        }

        Ok(None)
    }

    /// Rewrites the matching `KEY=VALUE` line preserving every other line
    /// verbatim, or appends a new trailing line when the key is absent.
    /// Whole-file rewrite; the last successful write wins.
    async fn persist(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let contents = fs::read_to_string(&self.path).unwrap_or_default();

        let mut lines: Vec<String> = Vec::new();
        let mut replaced = false;
        for line in contents.lines() {
            match line.split_once('=') {
                Some((name, _)) if name == key => {
                    lines.push(format!("{key}={value}"));
                    replaced = true;
                }
                _ => lines.push(line.to_string()),
            }
        }
        if !replaced {
            lines.push(format!("{key}={value}"));
        }

        let mut rewritten = lines.join("\n");
        rewritten.push('\n');

        fs::write(&self.path, rewritten).map_err(|e| {
            AuthError::PersistFailed(format!("writing {} failed: {e}", self.path.display()))
        })
    }
}
