use crate::config::PolicyConfig;

/// Long-lived hold/cooldown timers. Timestamps are milliseconds on the
/// session's monotonic clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerState {
    /// Set while confirmed; cleared on any confirmation gap or donation.
    pub hold_start: Option<u64>,
    /// None until the first donation, which is therefore never blocked by cooldown.
    pub last_donation: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Idle,
    Holding { held_ms: u64 },
    Fire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPolicy {
    pub hold_ms: u64,
    pub cooldown_ms: u64,
}

impl From<&PolicyConfig> for TriggerPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            hold_ms: config.hold_ms,
            cooldown_ms: config.cooldown_ms,
        }
    }
}

impl TriggerPolicy {
    pub fn new(hold_ms: u64, cooldown_ms: u64) -> Self {
        Self { hold_ms, cooldown_ms }
    }

    /// Advance the timers by one frame.
    ///
    /// A `Fire` decision has already been committed to the returned state:
    /// the cooldown starts now regardless of whether the donation later
    /// succeeds, and the next donation needs a fresh full hold.
    pub fn step(&self, state: TriggerState, confirmed: bool, now: u64) -> (TriggerState, TriggerDecision) {
        if !confirmed {
            let next = TriggerState {
                hold_start: None,
                ..state
            };
            return (next, TriggerDecision::Idle);
        }

        let hold_start = state.hold_start.unwrap_or(now);
        let held_ms = now.saturating_sub(hold_start);

        if held_ms >= self.hold_ms && self.cooldown_remaining_ms(&state, now) == 0 {
            let last_donation = state.last_donation.map_or(now, |last| last.max(now));
            let next = TriggerState {
                hold_start: None,
                last_donation: Some(last_donation),
            };
            return (next, TriggerDecision::Fire);
        }

        let next = TriggerState {
            hold_start: Some(hold_start),
            ..state
        };
        (next, TriggerDecision::Holding { held_ms })
    }

    /// `max(0, cooldown - (now - last_donation))`, zero before the first donation.
    pub fn cooldown_remaining_ms(&self, state: &TriggerState, now: u64) -> u64 {
        match state.last_donation {
            Some(last) => self.cooldown_ms.saturating_sub(now.saturating_sub(last)),
            None => 0,
        }
    }
}
