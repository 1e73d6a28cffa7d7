//! Technology enablement tracking
//!
//! The service reports three technology lists (available, enabled,
//! uninitialized). Local enable/disable requests add a pending marker so the
//! state can move to `Enabling` before the service confirms.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Derived state of one technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnologyState {
    Unavailable,
    Available,
    Uninitialized,
    Enabling,
    Enabled,
}

impl fmt::Display for TechnologyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TechnologyState::Unavailable => "unavailable",
            TechnologyState::Available => "available",
            TechnologyState::Uninitialized => "uninitialized",
            TechnologyState::Enabling => "enabling",
            TechnologyState::Enabled => "enabled",
        };
        f.write_str(name)
    }
}

/// Direction of an outstanding request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRequest {
    kind: RequestKind,
    sequence: u64,
}

/// What to do with a failed enable response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The enabling marker was cleared
    Cleared,
    /// The marker was already gone
    NotPending,
    /// A newer request superseded this one; the response was ignored
    Stale,
}

/// Tracks technology lists and in-flight enable/disable requests
#[derive(Debug, Default)]
pub struct TechnologyStateTracker {
    available: HashSet<String>,
    enabled: HashSet<String>,
    uninitialized: HashSet<String>,
    pending: HashMap<String, PendingRequest>,
    next_sequence: u64,
}

impl TechnologyStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the available list
    ///
    /// A technology that disappears loses any pending request.
    pub fn update_available(&mut self, technologies: &[String]) {
        self.available = technologies.iter().cloned().collect();
        let available = &self.available;
        self.pending.retain(|technology, _| {
            let keep = available.contains(technology);
            if !keep {
                debug!(technology, "technology removed while a request was pending");
            }
            keep
        });
    }

    /// Replace the enabled list
    ///
    /// Confirms pending enables for listed technologies and pending disables
    /// for unlisted ones.
    pub fn update_enabled(&mut self, technologies: &[String]) {
        self.enabled = technologies.iter().cloned().collect();
        let enabled = &self.enabled;
        self.pending.retain(|technology, request| match request.kind {
            RequestKind::Enable => !enabled.contains(technology),
            RequestKind::Disable => enabled.contains(technology),
        });
    }

    pub fn update_uninitialized(&mut self, technologies: &[String]) {
        self.uninitialized = technologies.iter().cloned().collect();
    }

    /// Record a local enable request, returning its sequence number
    pub fn begin_enable(&mut self, technology: &str) -> u64 {
        self.begin(technology, RequestKind::Enable)
    }

    /// Record a local disable request, returning its sequence number
    ///
    /// The technology stops counting as enabled immediately.
    pub fn begin_disable(&mut self, technology: &str) -> u64 {
        self.enabled.remove(technology);
        self.begin(technology, RequestKind::Disable)
    }

    fn begin(&mut self, technology: &str, kind: RequestKind) -> u64 {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.pending
            .insert(technology.to_string(), PendingRequest { kind, sequence });
        sequence
    }

    /// Handle a failed enable response
    ///
    /// With `discard_stale`, a failure for a request that has since been
    /// superseded leaves the newer request in place.
    pub fn enable_failed(
        &mut self,
        technology: &str,
        sequence: u64,
        discard_stale: bool,
    ) -> FailureOutcome {
        match self.pending.get(technology) {
            Some(request) if discard_stale && request.sequence != sequence => FailureOutcome::Stale,
            Some(request) if request.kind == RequestKind::Enable => {
                self.pending.remove(technology);
                FailureOutcome::Cleared
            }
            _ => FailureOutcome::NotPending,
        }
    }

    /// Handle a failed disable response
    ///
    /// The pending marker is dropped; the next enabled list decides the state.
    pub fn disable_failed(
        &mut self,
        technology: &str,
        sequence: u64,
        discard_stale: bool,
    ) -> FailureOutcome {
        match self.pending.get(technology) {
            Some(request) if discard_stale && request.sequence != sequence => FailureOutcome::Stale,
            Some(request) if request.kind == RequestKind::Disable => {
                self.pending.remove(technology);
                FailureOutcome::Cleared
            }
            _ => FailureOutcome::NotPending,
        }
    }

    pub fn is_available(&self, technology: &str) -> bool {
        self.available.contains(technology)
    }

    pub fn is_enabled(&self, technology: &str) -> bool {
        self.enabled.contains(technology)
    }

    pub fn is_enabling(&self, technology: &str) -> bool {
        matches!(
            self.pending.get(technology),
            Some(PendingRequest {
                kind: RequestKind::Enable,
                ..
            })
        )
    }

    pub fn is_uninitialized(&self, technology: &str) -> bool {
        self.uninitialized.contains(technology)
    }

    /// Derived state
    ///
    /// A technology that is neither available nor uninitialized is
    /// `Unavailable` whatever else is recorded for it.
    pub fn state(&self, technology: &str) -> TechnologyState {
        if !self.is_available(technology) && !self.is_uninitialized(technology) {
            TechnologyState::Unavailable
        } else if self.is_enabled(technology) {
            TechnologyState::Enabled
        } else if self.is_enabling(technology) {
            TechnologyState::Enabling
        } else if self.is_uninitialized(technology) {
            TechnologyState::Uninitialized
        } else {
            TechnologyState::Available
        }
    }

    /// Sorted technology names currently available
    pub fn available_technologies(&self) -> Vec<String> {
        let mut technologies: Vec<String> = self.available.iter().cloned().collect();
        technologies.sort();
        technologies
    }
}
