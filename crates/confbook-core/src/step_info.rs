//! Cached "current step" lookup
//!
//! The current step is the set of git tags pointing at `HEAD`. Looking it up
//! spawns git, so the answer is cached in a small JSON file with an expiry
//! decided by an injected [`Clock`].

use crate::config::MAX_CACHE_TTL_SECS;
use crate::error::{ConfbookError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedStep {
    value: String,
    expires_at: DateTime<Utc>,
}

/// File-backed cache for the current step
pub struct StepInfoCache<C: Clock = SystemClock> {
    path: PathBuf,
    ttl: Duration,
    clock: C,
}

impl StepInfoCache<SystemClock> {
    pub fn new(path: impl Into<PathBuf>, ttl_secs: u64) -> Self {
        Self::with_clock(path, ttl_secs, SystemClock)
    }
}

impl<C: Clock> StepInfoCache<C> {
    /// Lifetimes above [`MAX_CACHE_TTL_SECS`] are clamped
    pub fn with_clock(path: impl Into<PathBuf>, ttl_secs: u64, clock: C) -> Self {
        let secs = ttl_secs.min(MAX_CACHE_TTL_SECS) as i64;
        Self {
            path: path.into(),
            ttl: Duration::try_seconds(secs).unwrap_or_else(Duration::zero),
            clock,
        }
    }

    /// Cached value if still fresh, otherwise `compute` and cache its result
    pub fn get_or_compute<F>(&self, compute: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let now = self.clock.now();
        if let Some(cached) = self.read() {
            if cached.expires_at > now {
                debug!("Step info cache hit");
                return Ok(cached.value);
            }
        }

        let value = compute()?;
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(now);
        self.write(&CachedStep {
            value: value.clone(),
            expires_at,
        })?;
        Ok(value)
    }

    /// Drop the cached value
    pub fn invalidate(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> Option<CachedStep> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write(&self, entry: &CachedStep) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(entry)?)?;
        Ok(())
    }
}

/// Tags pointing at `HEAD` in `repo_dir`, as printed by git
pub fn git_tags_at_head(repo_dir: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["tag", "-l", "--points-at", "HEAD"])
        .current_dir(repo_dir)
        .output()
        .map_err(|e| ConfbookError::Command {
            command: "git tag".to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ConfbookError::Command {
            command: "git tag".to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
