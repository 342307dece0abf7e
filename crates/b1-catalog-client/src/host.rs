//! Active B1 host selection.
//!
//! B1 serves the same API from two hosts and some keys are only accepted by
//! the secondary one. A `HostSession` is created once per process and shared
//! by every request; after the primary rejects the key it switches to the
//! secondary for good.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Process-wide, sticky primary/secondary host selection.
#[derive(Debug)]
pub struct HostSession {
    primary: String,
    secondary: Option<String>,
    switched: AtomicBool,
}

impl HostSession {
    /// Create a session starting on `primary`.
    ///
    /// A secondary equal to the primary is dropped.
    pub fn new(primary: impl Into<String>, secondary: Option<String>) -> Self {
        let primary = trim_base(primary.into());
        let secondary = secondary
            .map(trim_base)
            .filter(|s| !s.is_empty() && *s != primary);
        Self {
            primary,
            secondary,
            switched: AtomicBool::new(false),
        }
    }

    /// Host requests should currently go to.
    pub fn active(&self) -> &str {
        match (&self.secondary, self.switched.load(Ordering::Acquire)) {
            (Some(secondary), true) => secondary,
            _ => &self.primary,
        }
    }

    /// Whether the switch to the secondary host already happened.
    pub fn has_switched(&self) -> bool {
        self.switched.load(Ordering::Acquire)
    }

    /// Fail over from `used_host` after a key rejection.
    ///
    /// Returns `true` when the request should be re-issued on the secondary:
    /// `used_host` was the primary and a secondary exists. Only the first
    /// caller performs (and logs) the switch.
    pub fn fail_over_from(&self, used_host: &str) -> bool {
        let Some(secondary) = &self.secondary else {
            return false;
        };
        if used_host != self.primary {
            return false;
        }
        if self
            .switched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            warn!(
                from = %self.primary,
                to = %secondary,
                "B1 rejected the API key, switching to secondary host"
            );
        }
        true
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
