//! Brute-force throttling for login attempts.
//!
//! After `threshold` consecutive failures every further failure locks the
//! account for `2^(failures-1)` seconds. Expiry is wall-clock gated: callers
//! can ask [`LockoutTracker::is_locked_out`] at any time, and the event loop
//! drives [`LockoutTracker::tick`] to fire the scheduled clears.
//!
//! Scheduled clears capture the tracker's epoch. `invalidate` bumps the
//! epoch, so a clear scheduled before a wipe never touches state after it.

use chrono::{DateTime, Duration, Utc};

/// Consecutive failure count and the active lock deadline, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginAttemptState {
    pub failure_count: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Lock length in seconds for the given failure count, or `None` below the threshold.
pub fn backoff_secs(failure_count: u32, threshold: u32, max_secs: u64) -> Option<u64> {
    if failure_count == 0 || failure_count < threshold {
        return None;
    }
    let secs = 1u64
        .checked_shl(failure_count - 1)
        .unwrap_or(u64::MAX);
    Some(secs.min(max_secs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingClear {
    epoch: u64,
    due: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LockoutTracker {
    state: LoginAttemptState,
    threshold: u32,
    max_backoff_secs: u64,
    epoch: u64,
    pending: Vec<PendingClear>,
}

impl LockoutTracker {
    pub fn new(threshold: u32, max_backoff_secs: u64) -> Self {
        Self {
            state: LoginAttemptState::default(),
            threshold,
            max_backoff_secs,
            epoch: 0,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> LoginAttemptState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending_timers(&self) -> usize {
        self.pending.len()
    }

    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state.locked_until, Some(until) if now < until)
    }

    /// Whole seconds left on the active lock, rounded up.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        let until = self.state.locked_until?;
        if now >= until {
            return None;
        }
        let ms = (until - now).num_milliseconds().max(0) as u64;
        Some(ms.div_ceil(1000))
    }

    /// Drop a lock whose deadline has passed. The failure count is kept.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        if let Some(until) = self.state.locked_until {
            if now >= until {
                self.state.locked_until = None;
            }
        }
    }

    /// Count a failed attempt. Returns the new deadline when this failure locks.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.state.failure_count = self.state.failure_count.saturating_add(1);
        let secs = backoff_secs(
            self.state.failure_count,
            self.threshold,
            self.max_backoff_secs,
        )?;
        let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
        let until = now
            .checked_add_signed(Duration::seconds(secs))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.state.locked_until = Some(until);
        self.pending.push(PendingClear {
            epoch: self.epoch,
            due: until,
        });
        Some(until)
    }

    /// Back to `{0, None}` after a successful login.
    pub fn reset(&mut self) {
        self.state = LoginAttemptState::default();
        self.pending.clear();
    }

    /// Reset and orphan every scheduled clear.
    pub fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.reset();
    }

    /// Fire scheduled clears that are due. Returns how many locks were lifted.
    pub fn tick(&mut self, now: DateTime<Utc>) -> usize {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;

        let mut cleared = 0;
        for timer in due {
            if timer.epoch != self.epoch {
                continue;
            }
            if self.state.locked_until == Some(timer.due) {
                self.state.locked_until = None;
                cleared += 1;
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn no_backoff_below_threshold() {
        for n in 0..3 {
            assert_eq!(backoff_secs(n, 3, 86_400), None);
        }
    }

    #[test]
    fn backoff_doubles_from_threshold() {
        assert_eq!(backoff_secs(3, 3, 86_400), Some(4));
        assert_eq!(backoff_secs(4, 3, 86_400), Some(8));
        assert_eq!(backoff_secs(5, 3, 86_400), Some(16));
        assert_eq!(backoff_secs(10, 3, 86_400), Some(512));
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff_secs(40, 3, 86_400), Some(86_400));
        assert_eq!(backoff_secs(200, 3, 60), Some(60));
    }

    #[test]
    fn first_two_failures_do_not_lock() {
        let mut tracker = LockoutTracker::new(3, 86_400);
        assert_eq!(tracker.record_failure(t0()), None);
        assert_eq!(tracker.record_failure(t0()), None);
        assert_eq!(tracker.state().failure_count, 2);
        assert_eq!(tracker.state().locked_until, None);
        assert_eq!(tracker.pending_timers(), 0);
    }

    #[test]
    fn third_failure_locks_for_four_seconds() {
        let mut tracker = LockoutTracker::new(3, 86_400);
        tracker.record_failure(t0());
        tracker.record_failure(t0());
        let until = tracker.record_failure(t0()).unwrap();
        assert_eq!(until, t0() + Duration::seconds(4));
        assert!(tracker.is_locked_out(t0()));
        assert_eq!(tracker.remaining_secs(t0()), Some(4));
        assert_eq!(
            tracker.remaining_secs(t0() + Duration::milliseconds(3500)),
            Some(1)
        );
        assert!(!tracker.is_locked_out(until));
    }

    #[test]
    fn expire_keeps_failure_count() {
        let mut tracker = LockoutTracker::new(3, 86_400);
        for _ in 0..3 {
            tracker.record_failure(t0());
        }
        tracker.expire(t0() + Duration::seconds(1));
        assert!(tracker.state().locked_until.is_some());
        tracker.expire(t0() + Duration::seconds(4));
        assert_eq!(tracker.state().locked_until, None);
        assert_eq!(tracker.state().failure_count, 3);

        let until = tracker.record_failure(t0() + Duration::seconds(5)).unwrap();
        assert_eq!(until, t0() + Duration::seconds(13));
    }

    #[test]
    fn tick_clears_due_lock_once() {
        let mut tracker = LockoutTracker::new(3, 86_400);
        for _ in 0..3 {
            tracker.record_failure(t0());
        }
        assert_eq!(tracker.tick(t0() + Duration::seconds(3)), 0);
        assert_eq!(tracker.pending_timers(), 1);
        assert_eq!(tracker.tick(t0() + Duration::seconds(4)), 1);
        assert_eq!(tracker.state().locked_until, None);
        assert_eq!(tracker.pending_timers(), 0);
        assert_eq!(tracker.tick(t0() + Duration::seconds(10)), 0);
    }

    #[test]
    fn stale_timer_after_invalidate_is_noop() {
        let mut tracker = LockoutTracker::new(3, 86_400);
        for _ in 0..3 {
            tracker.record_failure(t0());
        }
        let before = tracker.epoch();
        tracker.invalidate();
        assert_eq!(tracker.epoch(), before + 1);
        assert_eq!(tracker.state(), LoginAttemptState::default());
        assert_eq!(tracker.tick(t0() + Duration::seconds(60)), 0);
        assert_eq!(tracker.state(), LoginAttemptState::default());
    }

    #[test]
    fn superseded_timer_does_not_clear_newer_lock() {
        let mut tracker = LockoutTracker::new(3, 86_400);
        for _ in 0..3 {
            tracker.record_failure(t0());
        }
        // Lock lapses without a tick, then a fourth failure re-locks for 8s.
        let later = t0() + Duration::seconds(5);
        tracker.expire(later);
        let until = tracker.record_failure(later).unwrap();
        // The old 4s timer fires but must not lift the 8s lock.
        assert_eq!(tracker.tick(t0() + Duration::seconds(6)), 0);
        assert_eq!(tracker.state().locked_until, Some(until));
        assert_eq!(tracker.tick(until), 1);
    }
}
