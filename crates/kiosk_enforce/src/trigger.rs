//! Triggers and the debounced pass scheduler.
//!
//! Tree-change notifications, route hooks, and the fallback poll all used
//! to fire redundant work; they are unified behind one "request a pass"
//! entry point. Simultaneous trigger sources collapse to at most one
//! pending pass, preserving the single-pass-to-completion ordering
//! guarantee of the cooperative event loop.

use serde::{Deserialize, Serialize};

/// Why a pass was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Session just activated.
    Startup,

    /// The role set or policy table changed; marks are stale.
    PolicyChanged,

    /// The router reported a route change.
    RouteChanged,

    /// The tree observer reported a (possible) mutation.
    TreeChanged,

    /// Low-frequency fallback poll, catching drift the observer's signal
    /// set cannot see (route changes that mutate no tree node).
    FallbackTick,
}

impl Trigger {
    /// Stable name for journals and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Startup => "startup",
            Trigger::PolicyChanged => "policy-changed",
            Trigger::RouteChanged => "route-changed",
            Trigger::TreeChanged => "tree-changed",
            Trigger::FallbackTick => "fallback-tick",
        }
    }

    /// Coalescing priority (higher wins when requests collapse).
    fn priority(&self) -> u8 {
        match self {
            Trigger::PolicyChanged => 4,
            Trigger::Startup => 3,
            Trigger::RouteChanged => 2,
            Trigger::TreeChanged => 1,
            Trigger::FallbackTick => 0,
        }
    }

    /// Policy changes must not sit in the debounce window.
    fn bypasses_debounce(&self) -> bool {
        matches!(self, Trigger::PolicyChanged | Trigger::Startup)
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    trigger: Trigger,
    requested_at: u64,
}

/// Debounced single-slot pass scheduler.
///
/// All timestamps are host event-loop milliseconds; the scheduler never
/// reads a clock itself, which keeps it deterministic under test.
#[derive(Debug)]
pub struct PassScheduler {
    debounce_ms: u64,
    fallback_ms: u64,
    pending: Option<Pending>,
    coalesced: u64,
    last_pass_at: u64,
}

impl PassScheduler {
    pub fn new() -> Self {
        Self::with_intervals(crate::DEBOUNCE_MS, crate::FALLBACK_POLL_MS)
    }

    /// A scheduler with explicit intervals. `fallback_ms == 0` disables
    /// the fallback poll.
    pub fn with_intervals(debounce_ms: u64, fallback_ms: u64) -> Self {
        Self {
            debounce_ms,
            fallback_ms,
            pending: None,
            coalesced: 0,
            last_pass_at: 0,
        }
    }

    /// Request a pass. Requests arriving while one is pending collapse
    /// into it; the strongest trigger wins, the earliest timestamp is
    /// kept.
    pub fn request(&mut self, trigger: Trigger, now: u64) {
        match &mut self.pending {
            None => {
                self.pending = Some(Pending {
                    trigger,
                    requested_at: now,
                });
            }
            Some(pending) => {
                self.coalesced += 1;
                if trigger.priority() > pending.trigger.priority() {
                    pending.trigger = trigger;
                }
            }
        }
    }

    /// Take the trigger for a due pass, if any.
    ///
    /// A pending request becomes due once its debounce window elapses.
    /// With nothing pending, the fallback poll fires when enough time has
    /// passed since the last completed pass.
    pub fn poll(&mut self, now: u64) -> Option<Trigger> {
        if let Some(pending) = self.pending {
            let due = pending.trigger.bypasses_debounce()
                || now >= pending.requested_at + self.debounce_ms;
            if due {
                self.pending = None;
                return Some(pending.trigger);
            }
            return None;
        }

        if self.fallback_ms > 0 && now.saturating_sub(self.last_pass_at) >= self.fallback_ms {
            return Some(Trigger::FallbackTick);
        }

        None
    }

    /// Record a completed pass.
    pub fn complete(&mut self, now: u64) {
        self.last_pass_at = now;
    }

    /// Check if a request is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// How many requests collapsed into pending passes so far.
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}

impl Default for PassScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded exponential backoff for unavailable collaborators.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    base_ms: u64,
    max_attempts: u32,
    attempts: u32,
    next_at: u64,
}

impl RetryBackoff {
    pub fn new(base_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_ms,
            max_attempts,
            attempts: 0,
            next_at: 0,
        }
    }

    /// Check if a retry may run now.
    pub fn ready(&self, now: u64) -> bool {
        !self.exhausted() && now >= self.next_at
    }

    /// Record a failed attempt; the next retry backs off exponentially
    /// (capped at 32x base).
    pub fn record_failure(&mut self, now: u64) {
        self.attempts += 1;
        let factor = 1u64 << (self.attempts - 1).min(5);
        self.next_at = now + self.base_ms * factor;
    }

    /// Check if the retry budget is spent.
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reset after success.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.next_at = 0;
    }
}
