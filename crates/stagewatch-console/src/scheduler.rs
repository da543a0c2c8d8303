//! Deadline-driven auto-refresh.
//!
//! Nothing here sleeps: the event loop calls [`AutoRefresh::poll`] on every UI
//! tick and acts on the returned [`SchedulerTick`].

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_secs(120);
pub const MIN_INTERVAL_SECS: u64 = 5;
pub const MAX_INTERVAL_SECS: u64 = 3600;

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);
// A stalled loop catches up at most this many countdown steps per poll.
const MAX_CATCH_UP_STEPS: u32 = 3600;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerTick {
    pub refresh_due: bool,
    pub countdown_changed: bool,
    pub armed_changed: bool,
}

#[derive(Debug, Clone)]
pub struct AutoRefresh {
    enabled: bool,
    interval: Duration,
    idle_window: Duration,
    countdown_secs: u64,
    next_countdown_at: Instant,
    armed_deadline: Option<Instant>,
    last_activity: Instant,
    last_refreshed: Option<DateTime<Local>>,
    torn_down: bool,
}

impl AutoRefresh {
    /// The operator counts as active from `now`.
    pub fn new(interval_secs: u64, idle_window: Duration, enabled: bool, now: Instant) -> Self {
        let interval_secs = clamp_interval(interval_secs);
        Self {
            enabled,
            interval: Duration::from_secs(interval_secs),
            idle_window,
            countdown_secs: interval_secs,
            next_countdown_at: now + COUNTDOWN_STEP,
            armed_deadline: None,
            last_activity: now,
            last_refreshed: None,
            torn_down: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.armed_deadline = None;
        }
        self.reset_countdown(now);
    }

    pub fn toggle(&mut self, now: Instant) -> bool {
        self.set_enabled(!self.enabled, now);
        self.enabled
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval.as_secs()
    }

    pub fn set_interval(&mut self, secs: u64, now: Instant) {
        self.interval = Duration::from_secs(clamp_interval(secs));
        if self.armed_deadline.is_some() {
            self.armed_deadline = Some(now + self.interval);
        }
        self.reset_countdown(now);
    }

    pub fn countdown_secs(&self) -> u64 {
        self.countdown_secs
    }

    pub fn idle_window(&self) -> Duration {
        self.idle_window
    }

    pub fn record_activity(&mut self, now: Instant) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Whether input arrived within the trailing idle window.
    pub fn is_user_active(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_activity) < self.idle_window
    }

    pub fn is_armed(&self) -> bool {
        self.armed_deadline.is_some()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.last_refreshed
    }

    pub fn mark_refreshed(&mut self, at: DateTime<Local>) {
        self.last_refreshed = Some(at);
    }

    /// Manual or post-action refresh: the countdown and the pending deadline
    /// both start over.
    pub fn note_refresh(&mut self, now: Instant) {
        if self.armed_deadline.is_some() {
            self.armed_deadline = Some(now + self.interval);
        }
        self.reset_countdown(now);
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.armed_deadline = None;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn poll(&mut self, now: Instant) -> SchedulerTick {
        let mut tick = SchedulerTick::default();
        if self.torn_down {
            return tick;
        }

        let mut steps = 0;
        while now >= self.next_countdown_at && steps < MAX_CATCH_UP_STEPS {
            self.countdown_secs = if self.countdown_secs <= 1 {
                self.interval_secs()
            } else {
                self.countdown_secs - 1
            };
            self.next_countdown_at += COUNTDOWN_STEP;
            tick.countdown_changed = true;
            steps += 1;
        }
        if now >= self.next_countdown_at {
            self.next_countdown_at = now + COUNTDOWN_STEP;
        }

        let should_arm = self.enabled && self.is_user_active(now);
        match (should_arm, self.armed_deadline) {
            (true, None) => {
                self.armed_deadline = Some(now + self.interval);
                tick.armed_changed = true;
            }
            (false, Some(_)) => {
                self.armed_deadline = None;
                tick.armed_changed = true;
            }
            _ => {}
        }

        if let Some(deadline) = self.armed_deadline {
            if now >= deadline {
                tick.refresh_due = true;
                self.armed_deadline = Some(now + self.interval);
                self.reset_countdown(now);
                tick.countdown_changed = true;
            }
        }

        tick
    }

    fn reset_countdown(&mut self, now: Instant) {
        self.countdown_secs = self.interval_secs();
        self.next_countdown_at = now + COUNTDOWN_STEP;
    }
}

fn clamp_interval(secs: u64) -> u64 {
    secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn fires_every_interval_while_active() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(30, DEFAULT_IDLE_WINDOW, true, t0);
        assert!(auto.poll(t0).armed_changed);

        let mut fired = Vec::new();
        for s in 1..=90 {
            let now = t0 + secs(s);
            auto.record_activity(now);
            if auto.poll(now).refresh_due {
                fired.push(s);
            }
        }
        assert_eq!(fired, vec![30, 60, 90]);
    }

    #[test]
    fn idle_operator_gets_no_background_refresh() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(30, DEFAULT_IDLE_WINDOW, true, t0);
        auto.poll(t0);

        let mut fired = Vec::new();
        let mut previous = auto.countdown_secs();
        for s in 1..=400 {
            let tick = auto.poll(t0 + secs(s));
            if tick.refresh_due {
                fired.push(s);
            }
            if s > 120 {
                assert!(tick.countdown_changed, "countdown stalled at {s}s");
                assert_ne!(auto.countdown_secs(), previous, "countdown stalled at {s}s");
            }
            previous = auto.countdown_secs();
        }
        // Active until the window closes at 120 s, silent afterwards.
        assert_eq!(fired, vec![30, 60, 90]);
        assert!(!auto.is_armed());
    }

    #[test]
    fn activity_after_idling_rearms() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(30, DEFAULT_IDLE_WINDOW, true, t0);
        auto.poll(t0 + secs(200));
        assert!(!auto.is_armed());

        auto.record_activity(t0 + secs(201));
        let tick = auto.poll(t0 + secs(201));
        assert!(tick.armed_changed);
        assert!(auto.is_armed());
        assert!(!auto.poll(t0 + secs(230)).refresh_due);
        assert!(auto.poll(t0 + secs(231)).refresh_due);
    }

    #[test]
    fn countdown_runs_and_wraps_even_when_disarmed() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(5, DEFAULT_IDLE_WINDOW, false, t0);
        let mut seen = Vec::new();
        for s in 1..=6 {
            let tick = auto.poll(t0 + secs(s));
            assert!(tick.countdown_changed);
            assert!(!tick.refresh_due);
            seen.push(auto.countdown_secs());
        }
        assert_eq!(seen, vec![4, 3, 2, 1, 5, 4]);
    }

    #[test]
    fn manual_refresh_resets_countdown_and_deadline() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(30, DEFAULT_IDLE_WINDOW, true, t0);
        auto.poll(t0);
        auto.poll(t0 + secs(20));
        assert_eq!(auto.countdown_secs(), 10);

        auto.note_refresh(t0 + secs(20));
        assert_eq!(auto.countdown_secs(), 30);
        assert!(!auto.poll(t0 + secs(30)).refresh_due);
        assert!(auto.poll(t0 + secs(50)).refresh_due);
    }

    #[test]
    fn disabling_disarms_immediately() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(30, DEFAULT_IDLE_WINDOW, true, t0);
        auto.poll(t0);
        assert!(auto.is_armed());
        assert!(!auto.toggle(t0 + secs(1)));
        assert!(!auto.is_armed());
        assert!(!auto.poll(t0 + secs(31)).refresh_due);
    }

    #[test]
    fn teardown_silences_everything() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(30, DEFAULT_IDLE_WINDOW, true, t0);
        auto.poll(t0);
        auto.teardown();
        assert_eq!(auto.poll(t0 + secs(60)), SchedulerTick::default());
        assert!(!auto.is_armed());
    }

    #[test]
    fn interval_is_clamped() {
        let t0 = Instant::now();
        let mut auto = AutoRefresh::new(1, DEFAULT_IDLE_WINDOW, true, t0);
        assert_eq!(auto.interval_secs(), MIN_INTERVAL_SECS);
        auto.set_interval(u64::MAX, t0);
        assert_eq!(auto.interval_secs(), MAX_INTERVAL_SECS);
    }
}
