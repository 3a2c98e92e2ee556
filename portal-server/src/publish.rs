//! Best-effort version-control collaborator.
//!
//! Call sites catch `PublishError` and downgrade it to a warning in an
//! otherwise-successful response; a failed push must never fail the
//! request once the files are on disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::*;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("git {action} failed: {detail}")]
    Git { action: String, detail: String },

    #[error("could not run git: {0}")]
    Spawn(String),
}

pub trait Publisher: Send + Sync {
    /// Stages `paths` (relative to the project root), commits them with
    /// `message`, and pushes.
    fn publish(&self, paths: &[&str], message: &str) -> Result<(), PublishError>;
}

/// Shells out to the `git` CLI in the project directory.
pub struct GitPublisher {
    repo: PathBuf,
    remote: String,
    branch: String,
}

impl GitPublisher {
    pub fn new(repo: &Path, remote: String, branch: String) -> Self {
        GitPublisher {
            repo: repo.to_path_buf(),
            remote,
            branch,
        }
    }

    fn git(&self, args: &[&str]) -> Result<(), PublishError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .map_err(|e| PublishError::Spawn(e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PublishError::Git {
                action: args.first().unwrap_or(&"?").to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

impl Publisher for GitPublisher {
    fn publish(&self, paths: &[&str], message: &str) -> Result<(), PublishError> {
        let mut add_args = vec!["add"];
        add_args.extend_from_slice(paths);
        self.git(&add_args)?;

        self.git(&["commit", "-m", message])?;

        info!("pushing to {}/{}", self.remote, self.branch);
        self.git(&["push", &self.remote, &self.branch])?;

        Ok(())
    }
}

/// Installed with `--no-publish` and in tests.
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&self, _paths: &[&str], _message: &str) -> Result<(), PublishError> {
        debug!("publish disabled, skipping commit");
        Ok(())
    }
}
