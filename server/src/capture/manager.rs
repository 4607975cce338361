//! Capture Session Manager
//!
//! In-memory registry of capture sessions keyed by their opaque id.
//!
//! Every status change happens while holding the session's `DashMap` entry
//! write guard, so for concurrent callers racing on one session exactly one
//! transition succeeds and the rest observe the terminal state it left.

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::session::{CaptureError, CaptureSession, CaptureStatus, CreatedSession};
use crate::config::Config;

/// Lifetime and sizing knobs.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub public_base_url: String,
    pub ttl: Duration,
    pub retention_grace: Duration,
    pub max_pending_per_user: usize,
}

impl CaptureSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_base_url: config.public_base_url.clone(),
            ttl: Duration::seconds(config.capture_session_ttl_secs),
            retention_grace: Duration::seconds(config.capture_retention_grace_secs),
            max_pending_per_user: config.capture_max_pending_per_user,
        }
    }
}

/// Counts from one cleanup sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub removed: usize,
}

pub struct CaptureSessionManager {
    sessions: DashMap<String, CaptureSession>,
    pending_by_user: DashMap<Uuid, usize>,
    settings: CaptureSettings,
}

impl CaptureSessionManager {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            sessions: DashMap::new(),
            pending_by_user: DashMap::new(),
            settings,
        }
    }

    pub const fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Open a pending session for `user_id`.
    #[tracing::instrument(skip(self))]
    pub fn create_session(&self, user_id: Uuid) -> Result<CreatedSession, CaptureError> {
        let max = self.settings.max_pending_per_user;
        {
            let mut pending = self.pending_by_user.entry(user_id).or_insert(0);
            if *pending >= max {
                return Err(CaptureError::TooManySessions { max });
            }
            *pending += 1;
        }

        let now = Utc::now();
        let session_id = generate_session_id();
        let session = CaptureSession {
            session_id: session_id.clone(),
            user_id,
            status: CaptureStatus::Pending,
            created_at: now,
            expires_at: now + self.settings.ttl,
            finished_at: None,
            captured_payload: None,
        };
        let expires_at = session.expires_at;
        self.sessions.insert(session_id.clone(), session);

        info!(%user_id, %expires_at, "Capture session created");

        Ok(CreatedSession {
            capture_url: format!(
                "{}/api/capture/{}",
                self.settings.public_base_url.trim_end_matches('/'),
                session_id
            ),
            session_id,
            expires_at,
        })
    }

    /// Current snapshot. A pending session past its deadline is marked
    /// expired on the way out.
    pub fn get_session(&self, session_id: &str) -> Result<CaptureSession, CaptureError> {
        let (snapshot, released) = {
            let mut entry = self
                .sessions
                .get_mut(session_id)
                .ok_or(CaptureError::SessionNotFound)?;
            let expired = entry.expire_if_overdue(Utc::now());
            (entry.clone(), expired.then_some(entry.user_id))
        };
        if let Some(user_id) = released {
            self.release(user_id);
        }
        Ok(snapshot)
    }

    /// Store the captured payload. Succeeds once, from `Pending`, before the
    /// deadline.
    #[tracing::instrument(skip(self, payload))]
    pub fn complete_session(
        &self,
        session_id: &str,
        payload: serde_json::Value,
    ) -> Result<CaptureSession, CaptureError> {
        let session = self.transition(session_id, |session, now| {
            session.status = CaptureStatus::Completed;
            session.finished_at = Some(now);
            session.captured_payload = Some(payload);
        })?;
        info!(user_id = %session.user_id, "Capture session completed");
        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    pub fn cancel_session(&self, session_id: &str) -> Result<CaptureSession, CaptureError> {
        let session = self.transition(session_id, |session, now| {
            session.status = CaptureStatus::Cancelled;
            session.finished_at = Some(now);
        })?;
        info!(user_id = %session.user_id, "Capture session cancelled");
        Ok(session)
    }

    fn transition(
        &self,
        session_id: &str,
        apply: impl FnOnce(&mut CaptureSession, DateTime<Utc>),
    ) -> Result<CaptureSession, CaptureError> {
        let now = Utc::now();
        let (result, released) = {
            let mut entry = self
                .sessions
                .get_mut(session_id)
                .ok_or(CaptureError::SessionNotFound)?;
            let expired = entry.expire_if_overdue(now);
            match entry.terminal_error() {
                Some(err) => (Err(err), expired.then_some(entry.user_id)),
                None => {
                    apply(&mut *entry, now);
                    (Ok(entry.clone()), Some(entry.user_id))
                }
            }
        };
        if let Some(user_id) = released {
            self.release(user_id);
        }
        result
    }

    /// Expire overdue sessions and drop those finished longer ago than the
    /// retention grace period.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let grace = self.settings.retention_grace;
        let mut report = SweepReport::default();
        let mut released = Vec::new();

        self.sessions.retain(|_, session| {
            if session.expire_if_overdue(now) {
                report.expired += 1;
                released.push(session.user_id);
            }
            let stale = session
                .finished_at
                .is_some_and(|finished| now - finished >= grace);
            if stale {
                report.removed += 1;
            }
            !stale
        });

        for user_id in released {
            self.release(user_id);
        }

        if report.expired > 0 || report.removed > 0 {
            debug!(
                expired = report.expired,
                removed = report.removed,
                remaining = self.sessions.len(),
                "Capture sweep finished"
            );
        }
        report
    }

    /// Sessions still waiting for a payload.
    pub fn active_sessions(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .iter()
            .filter(|s| s.status == CaptureStatus::Pending && !s.is_overdue(now))
            .count()
    }

    /// All retained sessions, terminal ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn release(&self, user_id: Uuid) {
        if let Entry::Occupied(mut entry) = self.pending_by_user.entry(user_id) {
            let count = entry.get().saturating_sub(1);
            if count == 0 {
                entry.remove();
            } else {
                *entry.get_mut() = count;
            }
        }
    }
}

/// 32 random bytes, hex encoded.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
