//! Drift-free cycle cadence.
//!
//! Cycle `k` is scheduled at `origin + k * period`, computed from the grid
//! rather than from when the previous cycle finished, so conversion, read
//! and publish latency never accumulate.  A cycle that overruns whole
//! periods skips the slots it missed instead of bursting to catch up; the
//! next start is still a grid point.

use core::time::Duration;

#[derive(Debug, Clone)]
pub struct CycleSchedule {
    period: Duration,
    origin: Option<Duration>,
    slot: u64,
    skipped: u64,
}

impl CycleSchedule {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            origin: None,
            slot: 0,
            skipped: 0,
        }
    }

    /// Anchor slot 0 at `now`.  No effect once started.
    pub fn start(&mut self, now: Duration) {
        if self.origin.is_none() {
            self.origin = Some(now);
            self.slot = 0;
        }
    }

    pub fn is_started(&self) -> bool {
        self.origin.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Index of the current slot.
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Slots skipped because a cycle overran.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Scheduled start of the current slot.
    pub fn current_start(&self) -> Duration {
        self.slot_start(self.slot)
    }

    /// Move to the next slot and return how long to sleep until it starts.
    pub fn advance(&mut self, now: Duration) -> Duration {
        self.start(now);
        let mut next = self.slot + 1;

        if !self.period.is_zero() && self.slot_start(next) < now {
            let origin = self.origin.unwrap_or(now);
            let elapsed = now.saturating_sub(origin).as_nanos();
            let due = elapsed.div_ceil(self.period.as_nanos());
            let due = u64::try_from(due).unwrap_or(u64::MAX);
            self.skipped += due - next;
            next = due;
        }

        self.slot = next;
        self.slot_start(next).saturating_sub(now)
    }

    fn slot_start(&self, slot: u64) -> Duration {
        let origin = self.origin.unwrap_or_default();
        let offset = self.period.as_nanos().saturating_mul(u128::from(slot));
        origin + Duration::from_nanos(u64::try_from(offset).unwrap_or(u64::MAX))
    }
}
