//! Countdown driver and clock formatting
//!
//! The driver owns the countdown's frame loop handle. Each frame it steps the
//! session against the wall clock; once the countdown hits zero it cancels
//! its own handle so the loop stops on the next frame.

use std::fmt;

use crate::platform::FrameHandle;
use crate::vault::{VaultNotice, VaultSession, VaultStatus, tick_countdown};

/// Milliseconds left until `end_ms`, never negative
#[inline]
pub fn remaining_ms(end_ms: u64, now: u64) -> u64 {
    end_ms.saturating_sub(now)
}

/// Countdown split for display as `HH:MM:SS.hh`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDisplay {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub hundredths: u64,
}

impl ClockDisplay {
    pub fn from_ms(ms: u64) -> Self {
        let total_seconds = ms / 1000;
        Self {
            hours: total_seconds / 3600,
            minutes: (total_seconds % 3600) / 60,
            seconds: total_seconds % 60,
            hundredths: (ms % 1000) / 10,
        }
    }
}

impl fmt::Display for ClockDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:02}",
            self.hours, self.minutes, self.seconds, self.hundredths
        )
    }
}

/// Remaining wheel cooldown, e.g. `59m 07s`
pub fn format_cooldown(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{}m {:02}s", minutes, seconds)
}

/// Single countdown loop per vault
#[derive(Debug, Default)]
pub struct CountdownDriver {
    handle: Option<FrameHandle>,
}

impl CountdownDriver {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Start the loop, replacing (and cancelling) any previous one
    pub fn start(&mut self) -> FrameHandle {
        self.stop();
        let handle = FrameHandle::new("countdown");
        self.handle = Some(handle.clone());
        handle
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(FrameHandle::is_active)
    }

    pub fn handle(&self) -> Option<&FrameHandle> {
        self.handle.as_ref().filter(|h| h.is_active())
    }

    /// One frame of the countdown
    pub fn step(&mut self, session: &mut VaultSession, now: u64) -> Vec<VaultNotice> {
        if !self.is_running() {
            return Vec::new();
        }

        let notices = tick_countdown(session, now);
        if session.status != VaultStatus::Running {
            self.stop();
        }
        notices
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clock_display_padding() {
        let d = ClockDisplay::from_ms(3_723_450);
        assert_eq!(d.hours, 1);
        assert_eq!(d.minutes, 2);
        assert_eq!(d.seconds, 3);
        assert_eq!(d.hundredths, 45);
        assert_eq!(d.to_string(), "01:02:03.45");
        assert_eq!(ClockDisplay::from_ms(0).to_string(), "00:00:00.00");
    }

    #[test]
    fn test_remaining_never_negative() {
        assert_eq!(remaining_ms(10_000, 4_000), 6_000);
        assert_eq!(remaining_ms(10_000, 10_000), 0);
        assert_eq!(remaining_ms(10_000, 99_000), 0);
    }

    #[test]
    fn test_format_cooldown() {
        assert_eq!(format_cooldown(3_600_000), "60m 00s");
        assert_eq!(format_cooldown(61_999), "1m 01s");
    }

    #[test]
    fn test_drop_cancels_loop() {
        let mut driver = CountdownDriver::new();
        let handle = driver.start();
        assert!(driver.is_running());
        drop(driver);
        assert!(!handle.is_active());
    }

    #[test]
    fn test_restart_cancels_previous_loop() {
        let mut driver = CountdownDriver::new();
        let first = driver.start();
        let second = driver.start();
        assert!(!first.is_active());
        assert!(second.is_active());
    }

    proptest! {
        #[test]
        fn prop_display_recombines(ms in 0u64..400_000_000) {
            let d = ClockDisplay::from_ms(ms);
            prop_assert!(d.minutes < 60 && d.seconds < 60 && d.hundredths < 100);
            let back = ((d.hours * 3600 + d.minutes * 60 + d.seconds) * 1000) + d.hundredths * 10;
            prop_assert_eq!(back, ms - ms % 10);
        }
    }
}
