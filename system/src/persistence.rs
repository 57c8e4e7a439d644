use crate::config::TimingConfig;
use crate::document::Document;
use crate::traits::SaveIndicator;
use crate::types::SessionCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub session_code: SessionCode,
    pub content: String,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("credential rejected")]
    Unauthorized,
    #[error("save rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("save endpoint unreachable: {0}")]
    Unreachable(String),
}

impl PersistenceError {
    /// Classifies a non-success HTTP status; `0` stands for a request that never got a
    /// response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            0 => Self::Unreachable(message.into()),
            401 | 403 => Self::Unauthorized,
            status => Self::Rejected {
                status,
                message: message.into(),
            },
        }
    }
}

/// Why a save is being attempted, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    FirstEdit,
    Debounce,
    Periodic,
    PageLeave,
}

/// Decides when the document is saved.
///
/// Timers are deadlines on the session clock; the owner evaluates them with [`Self::due`]
/// and wakes up again at [`Self::next_deadline`].
#[derive(Debug)]
pub struct PersistenceScheduler {
    timing: TimingConfig,
    first_edit_seen: bool,
    first_save_at: Option<Duration>,
    debounce_at: Option<Duration>,
    next_periodic: Duration,
    clock: Duration,
    in_flight: Option<InFlight>,
}

/// A save handed to the host and not reported back yet.
#[derive(Debug)]
struct InFlight {
    content: String,
    since: Duration,
}

impl PersistenceScheduler {
    pub fn new(timing: TimingConfig, now: Duration) -> Self {
        let next_periodic = now + timing.periodic_save();
        Self {
            timing,
            first_edit_seen: false,
            first_save_at: None,
            debounce_at: None,
            next_periodic,
            clock: now,
            in_flight: None,
        }
    }

    /// Restarts the debounce window; the very first edit of an authenticated participant
    /// who never saved also arms the quick first save.
    pub fn on_local_edit(&mut self, now: Duration, document: &Document, authenticated: bool) {
        self.clock = now;
        if !self.first_edit_seen {
            self.first_edit_seen = true;
            if authenticated && !document.ever_saved() {
                self.first_save_at = Some(now + self.timing.first_save_delay());
            }
        }
        self.debounce_at = Some(now + self.timing.save_debounce());
    }

    /// Consumes every timer due at `now` and returns the highest-precedence trigger among
    /// them. The periodic timer only counts while the document is dirty.
    ///
    /// A save the host never reported within `saveTimeoutMs` is forgotten here, so later
    /// triggers may send the same content again.
    pub fn due(&mut self, now: Duration, document: &Document) -> Option<SaveTrigger> {
        self.clock = now;
        let timeout = self.timing.save_timeout();
        if let Some(pending) = &self.in_flight {
            if now.saturating_sub(pending.since) >= timeout {
                log::warn!("Save started at {:?} was never reported, retrying", pending.since);
                self.in_flight = None;
            }
        }
        let mut fired = None;
        if self.first_save_at.map_or(false, |at| at <= now) {
            self.first_save_at = None;
            fired = Some(SaveTrigger::FirstEdit);
        }
        if self.debounce_at.map_or(false, |at| at <= now) {
            self.debounce_at = None;
            fired.get_or_insert(SaveTrigger::Debounce);
        }
        if self.next_periodic <= now {
            let period = self.timing.periodic_save();
            while self.next_periodic <= now {
                self.next_periodic += period;
            }
            if document.is_dirty() {
                fired.get_or_insert(SaveTrigger::Periodic);
            }
        }
        fired
    }

    /// Builds the request for a trigger, or `None` when there is nothing to save, no session
    /// to save into, or the same content is already on its way.
    pub fn prepare(
        &mut self,
        trigger: SaveTrigger,
        document: &Document,
        session_code: &str,
        bearer: Option<&str>,
    ) -> Option<SaveRequest> {
        if session_code.is_empty() {
            log::debug!("Skipping {:?} save: no session code", trigger);
            return None;
        }
        if !document.is_dirty() {
            return None;
        }
        if trigger != SaveTrigger::PageLeave {
            if self.is_in_flight(document.content()) {
                log::debug!("Skipping {:?} save: same content in flight", trigger);
                return None;
            }
            self.in_flight = Some(InFlight {
                content: document.content().to_owned(),
                since: self.clock,
            });
        }
        log::info!("Saving session {} ({:?})", session_code, trigger);
        Some(SaveRequest {
            session_code: session_code.to_owned(),
            content: document.content().to_owned(),
            bearer: bearer.map(str::to_owned),
        })
    }

    /// Records the outcome of an awaited save. On failure the snapshot stays where it was so
    /// the next trigger retries the same content.
    pub fn finish(
        &mut self,
        content: &str,
        outcome: Result<(), PersistenceError>,
        document: &mut Document,
    ) -> SaveIndicator {
        if self.is_in_flight(content) {
            self.in_flight = None;
        }
        match outcome {
            Ok(()) => {
                document.mark_saved(content);
                SaveIndicator::Saved
            }
            Err(PersistenceError::Unauthorized) => {
                log::warn!("Save rejected: credential no longer valid");
                SaveIndicator::CredentialRejected
            }
            Err(err) => {
                log::warn!("Save failed: {}", err);
                SaveIndicator::Failed
            }
        }
    }

    fn is_in_flight(&self, content: &str) -> bool {
        self.in_flight
            .as_ref()
            .map_or(false, |pending| pending.content == content)
    }

    pub fn next_deadline(&self) -> Duration {
        [self.first_save_at, self.debounce_at]
            .iter()
            .flatten()
            .copied()
            .fold(self.next_periodic, Duration::min)
    }
}
