//! Vault session state
//!
//! Everything the UI shows lives in [`VaultSession`]. It is owned by a single
//! UI session and never shared; backups are the only way it outlives one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::ABORT_CONFIRM_MS;
use crate::countdown::remaining_ms;
use crate::image::ImageData;
use crate::wheel::{GameState, WheelGame};

/// Which entry panel is showing while idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VaultMode {
    /// Upload a new image
    #[default]
    New,
    /// Import a backup artifact
    Restore,
}

/// Lifecycle of a vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VaultStatus {
    /// Nothing loaded
    #[default]
    Idle,
    /// Image loaded, duration being set
    Ready,
    /// Countdown in progress
    Running,
    /// Countdown finished, image visible
    Revealed,
}

impl VaultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultStatus::Idle => "idle",
            VaultStatus::Ready => "ready",
            VaultStatus::Running => "running",
            VaultStatus::Revealed => "revealed",
        }
    }
}

impl fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Duration as entered: hours, minutes, seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationInput {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Default for DurationInput {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            seconds: 10,
        }
    }
}

impl DurationInput {
    pub fn new(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Split a second count back into fields (as done on restore)
    pub fn from_total_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours
            .saturating_mul(3600)
            .saturating_add(self.minutes.saturating_mul(60))
            .saturating_add(self.seconds)
    }
}

/// The in-memory vault
#[derive(Debug, Clone, PartialEq)]
pub struct VaultSession {
    pub mode: VaultMode,
    pub status: VaultStatus,
    pub image: Option<ImageData>,
    pub file_name: String,
    pub duration: DurationInput,
    /// Epoch ms at which the countdown ends (valid while running)
    pub end_ms: u64,
    /// Last remaining time observed by the countdown
    pub time_left_ms: u64,
    /// Duration came from a backup and can no longer be edited
    pub time_locked: bool,
    pub has_downloaded_backup: bool,
    /// "Start without a backup?" gate is showing
    pub backup_warning: bool,
    /// Epoch ms of the first abort press, while awaiting confirmation
    pub abort_armed_at: Option<u64>,
    pub game: GameState,
    /// Open fate wheel overlay
    pub wheel: Option<WheelGame>,
}

impl VaultSession {
    pub fn new(entropy_seed: i64, duration: DurationInput) -> Self {
        Self {
            mode: VaultMode::New,
            status: VaultStatus::Idle,
            image: None,
            file_name: String::new(),
            duration,
            end_ms: 0,
            time_left_ms: 0,
            time_locked: false,
            has_downloaded_backup: false,
            backup_warning: false,
            abort_armed_at: None,
            game: GameState::new(entropy_seed),
            wheel: None,
        }
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration.total_seconds()
    }

    pub fn remaining_ms(&self, now: u64) -> u64 {
        match self.status {
            VaultStatus::Running => remaining_ms(self.end_ms, now),
            _ => 0,
        }
    }

    /// First abort press is still waiting for its confirmation
    pub fn is_abort_armed(&self, now: u64) -> bool {
        self.abort_armed_at
            .is_some_and(|armed| now.saturating_sub(armed) < ABORT_CONFIRM_MS)
    }

    /// The wheel can be opened right now
    pub fn can_open_wheel(&self) -> bool {
        self.status == VaultStatus::Running && self.wheel.is_none() && self.game.can_play()
    }

    /// Starting would hit the "no backup yet" gate
    pub fn needs_backup_warning(&self) -> bool {
        !self.has_downloaded_backup && !self.time_locked
    }
}
