//! Bounded per-invocation audit trail of B1 calls.
//!
//! Holds the last `capacity` request/response/error events, oldest evicted
//! first. The API key is redacted before anything is stored. The trail is
//! only ever returned in error responses.

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

/// Maximum characters kept per event detail.
pub const MAX_DETAIL_CHARS: usize = 2000;

const REDACTED: &str = "***";

/// What an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Request,
    Response,
    Error,
}

/// One recorded event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub kind: AuditKind,
    pub url: String,
    pub detail: String,
}

/// Ring buffer of recent B1 calls.
#[derive(Debug)]
pub struct AuditTrail {
    capacity: usize,
    secret: Option<String>,
    events: Mutex<VecDeque<AuditEvent>>,
}

impl AuditTrail {
    /// Create a trail keeping at most `capacity` events, redacting `secret`.
    pub fn new(capacity: usize, secret: Option<String>) -> Self {
        Self {
            capacity,
            secret: secret.filter(|s| !s.is_empty()),
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Record an event, evicting the oldest one when full.
    pub fn record(&self, kind: AuditKind, url: &str, detail: &str) {
        if self.capacity == 0 {
            return;
        }
        let event = AuditEvent {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            kind,
            url: self.redact(url),
            detail: truncate(&self.redact(detail), MAX_DETAIL_CHARS),
        };

        let mut events = self.events.lock();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Copy of the recorded events, oldest first.
    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    fn redact(&self, text: &str) -> String {
        match &self.secret {
            Some(secret) => text.replace(secret.as_str(), REDACTED),
            None => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
