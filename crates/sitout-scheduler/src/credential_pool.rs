//! Round-robin credential rotation with health tracking.
//!
//! Credentials rejected as invalid stay out of rotation until
//! [`CredentialPool::reset_health`]. Rate-limited credentials are forgiven in
//! bulk once the cooldown window opened by the first rate-limit mark has
//! elapsed; there are no per-credential timers.
//!
//! The window is shared: a credential marked late in an open window is
//! cleared with the rest when that window ends, so its own wait can be much
//! shorter than the cooldown. The next mark after a sweep opens a new window.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sitout_config::mask_secret;
use sitout_core::{FailureClass, GenerationFailure};
use tracing::{debug, info, warn};

/// Default forgiveness window for rate-limited credentials.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialHealth {
    Healthy,
    /// Temporarily out of rotation until the cooldown sweep.
    RateLimited,
    /// Out of rotation until an explicit reset.
    Invalid,
}

impl std::fmt::Display for CredentialHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::RateLimited => write!(f, "rate-limited"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialRecord {
    secret: String,
    pub health: CredentialHealth,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl CredentialRecord {
    fn new(secret: String) -> Self {
        Self {
            secret,
            health: CredentialHealth::Healthy,
            last_tested_at: None,
            last_error: None,
        }
    }

    pub fn healthy(&self) -> bool {
        self.health == CredentialHealth::Healthy
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.secret)
    }
}

/// A credential lent out for one provider attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHandle {
    index: usize,
    masked: String,
}

impl CredentialHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Loggable form of the secret.
    pub fn masked(&self) -> &str {
        &self.masked
    }
}

/// Diagnostic view of one credential (secret masked).
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatus {
    pub index: usize,
    pub key: String,
    pub health: CredentialHealth,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct CredentialPool {
    records: Vec<CredentialRecord>,
    cursor: usize,
    cooldown: Duration,
    rate_limited_since: Option<Instant>,
}

impl CredentialPool {
    pub fn new(secrets: Vec<String>, cooldown: Duration) -> Self {
        Self {
            records: secrets.into_iter().map(CredentialRecord::new).collect(),
            cursor: 0,
            cooldown,
            rate_limited_since: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Healthy credentials right now, applying the cooldown sweep first.
    pub fn healthy_count(&mut self) -> usize {
        self.healthy_count_at(Instant::now())
    }

    pub fn healthy_count_at(&mut self, now: Instant) -> usize {
        self.sweep(now);
        self.records.iter().filter(|r| r.healthy()).count()
    }

    pub fn acquire(&mut self) -> Result<CredentialHandle, GenerationFailure> {
        self.acquire_excluding_at(&[], Instant::now())
    }

    pub fn acquire_at(&mut self, now: Instant) -> Result<CredentialHandle, GenerationFailure> {
        self.acquire_excluding_at(&[], now)
    }

    /// Acquire the next healthy credential not in `tried`.
    ///
    /// A tried credential is only handed out again once every healthy
    /// credential has been tried.
    pub fn acquire_excluding(
        &mut self,
        tried: &[CredentialHandle],
    ) -> Result<CredentialHandle, GenerationFailure> {
        self.acquire_excluding_at(tried, Instant::now())
    }

    pub fn acquire_excluding_at(
        &mut self,
        tried: &[CredentialHandle],
        now: Instant,
    ) -> Result<CredentialHandle, GenerationFailure> {
        self.sweep(now);
        let total = self.records.len();
        if total == 0 {
            return Err(GenerationFailure::NoCredentialAvailable);
        }

        let was_tried = |idx: usize| tried.iter().any(|h| h.index == idx);
        let order: Vec<usize> = (0..total).map(|offset| (self.cursor + offset) % total).collect();

        let chosen = order
            .iter()
            .copied()
            .find(|&idx| self.records[idx].healthy() && !was_tried(idx))
            .or_else(|| {
                order
                    .iter()
                    .copied()
                    .find(|&idx| self.records[idx].healthy())
            });

        match chosen {
            Some(index) => {
                self.cursor = (index + 1) % total;
                let handle = CredentialHandle {
                    index,
                    masked: self.records[index].masked(),
                };
                debug!(key = %handle.masked, index, "Round-robin selected credential");
                Ok(handle)
            }
            None => {
                debug!(total, "No healthy credential available");
                Err(GenerationFailure::NoCredentialAvailable)
            }
        }
    }

    /// Handle for the credential at `index`, regardless of health.
    pub fn handle(&self, index: usize) -> Option<CredentialHandle> {
        self.records.get(index).map(|r| CredentialHandle {
            index,
            masked: r.masked(),
        })
    }

    /// Secret for a handle issued by this pool.
    pub fn secret(&self, handle: &CredentialHandle) -> &str {
        &self.records[handle.index].secret
    }

    pub fn report_success(&mut self, handle: &CredentialHandle) {
        if let Some(record) = self.records.get_mut(handle.index) {
            record.health = CredentialHealth::Healthy;
            record.last_tested_at = Some(Utc::now());
            record.last_error = None;
        }
    }

    pub fn report_failure(&mut self, handle: &CredentialHandle, class: FailureClass, detail: &str) {
        self.report_failure_at(handle, class, detail, Instant::now());
    }

    pub fn report_failure_at(
        &mut self,
        handle: &CredentialHandle,
        class: FailureClass,
        detail: &str,
        now: Instant,
    ) {
        let Some(record) = self.records.get_mut(handle.index) else {
            return;
        };
        record.last_tested_at = Some(Utc::now());
        record.last_error = Some(detail.to_string());

        match class {
            FailureClass::AuthOrInvalid => {
                record.health = CredentialHealth::Invalid;
                warn!(key = %handle.masked, "Credential rejected; removed from rotation");
            }
            FailureClass::RateLimited => {
                if record.health != CredentialHealth::Invalid {
                    record.health = CredentialHealth::RateLimited;
                }
                self.rate_limited_since.get_or_insert(now);
                debug!(key = %handle.masked, "Credential rate-limited; cooling down");
            }
            FailureClass::Unknown => {}
        }
    }

    /// Return every credential to rotation, including invalid ones.
    pub fn reset_health(&mut self) {
        for record in &mut self.records {
            record.health = CredentialHealth::Healthy;
            record.last_error = None;
        }
        self.rate_limited_since = None;
    }

    pub fn status(&self) -> Vec<CredentialStatus> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, r)| CredentialStatus {
                index,
                key: r.masked(),
                health: r.health,
                last_tested_at: r.last_tested_at,
                last_error: r.last_error.clone(),
            })
            .collect()
    }

    fn sweep(&mut self, now: Instant) {
        let Some(since) = self.rate_limited_since else {
            return;
        };
        if now.duration_since(since) < self.cooldown {
            return;
        }
        let mut forgiven = 0;
        for record in &mut self.records {
            if record.health == CredentialHealth::RateLimited {
                record.health = CredentialHealth::Healthy;
                forgiven += 1;
            }
        }
        self.rate_limited_since = None;
        if forgiven > 0 {
            info!(forgiven, "Cooldown elapsed; rate-limited credentials back in rotation");
        }
    }
}
