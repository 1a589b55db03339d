//! Vault transitions
//!
//! `apply` handles user actions, `tick_countdown` and `tick_wheel` advance
//! the two frame loops. All three take the time (and any fresh randomness)
//! through their arguments, so the same inputs always give the same session.
//! An action that returns `Err` leaves the session exactly as it was.

use crate::backup::{self, BackupArtifact, BackupKind, BackupPayload};
use crate::consts::{ABORT_CONFIRM_MS, UNKNOWN_FILE_NAME};
use crate::countdown::remaining_ms;
use crate::error::{Result, VaultError};
use crate::image::ImageData;
use crate::wheel::game::WheelUpdate;
use crate::wheel::{GameState, SECTORS, WheelGame, WheelPhase};

use super::state::{DurationInput, VaultMode, VaultSession, VaultStatus};

/// Outside inputs for one transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    /// Wall clock, epoch ms
    pub now_ms: u64,
    /// Seed for any game state created by this transition
    pub fresh_seed: i64,
    /// Duration a reset session starts with
    pub default_duration: DurationInput,
}

/// User actions
#[derive(Debug, Clone, PartialEq)]
pub enum VaultAction {
    SelectMode(VaultMode),
    UploadImage { file_name: String, image: ImageData },
    /// Raw artifact bytes as read from the file
    RestoreBackup { bytes: Vec<u8> },
    SetDuration(DurationInput),
    ExportBackup,
    ExportMidRun,
    Start,
    ProceedWithoutBackup,
    DismissBackupWarning,
    Abort,
    OpenWheel,
    SpinWheel,
    CloseWheel,
    Reset,
}

impl VaultAction {
    pub fn name(&self) -> &'static str {
        match self {
            VaultAction::SelectMode(_) => "select mode",
            VaultAction::UploadImage { .. } => "upload image",
            VaultAction::RestoreBackup { .. } => "restore backup",
            VaultAction::SetDuration(_) => "set duration",
            VaultAction::ExportBackup => "export backup",
            VaultAction::ExportMidRun => "export mid-run save",
            VaultAction::Start => "start",
            VaultAction::ProceedWithoutBackup => "start without backup",
            VaultAction::DismissBackupWarning => "dismiss backup warning",
            VaultAction::Abort => "abort",
            VaultAction::OpenWheel => "open wheel",
            VaultAction::SpinWheel => "spin wheel",
            VaultAction::CloseWheel => "close wheel",
            VaultAction::Reset => "reset",
        }
    }
}

/// Things the UI should react to
#[derive(Debug, Clone, PartialEq)]
pub enum VaultNotice {
    ModeChanged(VaultMode),
    ImageLoaded { file_name: String },
    Restored { file_name: String, duration_seconds: u64 },
    DurationSet { seconds: u64 },
    /// Start was intercepted: no backup downloaded yet
    BackupWarning,
    BackupWarningDismissed,
    BackupReady(BackupArtifact),
    Started { end_ms: u64 },
    AbortArmed { expires_at: u64 },
    AbortDisarmed,
    Reset,
    Revealed,
    CooldownCleared,
    WheelOpened,
    WheelClosed,
    SpinStarted { stop_angle: f64, target_rotation: f64 },
    SpinLanded { sector: usize },
    SpinSettled { sector: usize, delta_ms: i64, attempts_remaining: u8 },
    CooldownStarted { until_ms: u64 },
}

/// Apply `action` to `session`
pub fn apply(
    session: &mut VaultSession,
    action: VaultAction,
    ctx: &TickContext,
) -> Result<Vec<VaultNotice>> {
    let now = ctx.now_ms;
    match action {
        VaultAction::SelectMode(mode) => {
            require_status(session, VaultStatus::Idle, "switch mode")?;
            session.mode = mode;
            Ok(vec![VaultNotice::ModeChanged(mode)])
        }

        VaultAction::UploadImage { file_name, image } => {
            require_status(session, VaultStatus::Idle, "upload an image")?;
            if image.is_empty() {
                return Err(VaultError::NoImage);
            }
            session.image = Some(image);
            session.file_name = file_name.clone();
            session.status = VaultStatus::Ready;
            session.time_locked = false;
            session.has_downloaded_backup = false;
            session.backup_warning = false;
            session.game = GameState::new(ctx.fresh_seed);
            Ok(vec![VaultNotice::ImageLoaded { file_name }])
        }

        VaultAction::RestoreBackup { bytes } => {
            require_status(session, VaultStatus::Idle, "restore a backup")?;
            let payload = backup::decode(&bytes)?;
            Ok(vec![restore(session, payload, ctx.fresh_seed)])
        }

        VaultAction::SetDuration(duration) => {
            require_status(session, VaultStatus::Ready, "change the duration")?;
            if session.time_locked {
                return Err(VaultError::DurationLocked);
            }
            session.duration = duration;
            Ok(vec![VaultNotice::DurationSet {
                seconds: duration.total_seconds(),
            }])
        }

        VaultAction::ExportBackup => {
            require_status(session, VaultStatus::Ready, "export a backup")?;
            let seconds = session.duration_seconds();
            if seconds == 0 {
                return Err(VaultError::InvalidDuration);
            }
            let artifact = export(session, seconds, BackupKind::Full, now)?;
            session.has_downloaded_backup = true;
            session.backup_warning = false;
            Ok(vec![VaultNotice::BackupReady(artifact)])
        }

        VaultAction::ExportMidRun => {
            require_status(session, VaultStatus::Running, "save mid-run")?;
            let seconds = remaining_ms(session.end_ms, now) / 1000;
            if seconds == 0 {
                // Nothing left worth saving; no artifact, no error.
                log::warn!("Mid-run save skipped: countdown has no whole seconds left");
                return Ok(Vec::new());
            }
            let artifact = export(session, seconds, BackupKind::MidRun, now)?;
            Ok(vec![VaultNotice::BackupReady(artifact)])
        }

        VaultAction::Start => {
            require_status(session, VaultStatus::Ready, "start")?;
            let seconds = session.duration_seconds();
            if seconds == 0 {
                return Err(VaultError::InvalidDuration);
            }
            let end_ms = end_time(seconds, now)?;
            if session.needs_backup_warning() {
                session.backup_warning = true;
                return Ok(vec![VaultNotice::BackupWarning]);
            }
            Ok(vec![start_timer(session, end_ms, now)])
        }

        VaultAction::ProceedWithoutBackup => {
            require_status(session, VaultStatus::Ready, "start")?;
            let seconds = session.duration_seconds();
            if seconds == 0 {
                return Err(VaultError::InvalidDuration);
            }
            let end_ms = end_time(seconds, now)?;
            Ok(vec![start_timer(session, end_ms, now)])
        }

        VaultAction::DismissBackupWarning => {
            if !session.backup_warning {
                return Ok(Vec::new());
            }
            session.backup_warning = false;
            Ok(vec![VaultNotice::BackupWarningDismissed])
        }

        VaultAction::Abort => {
            require_status(session, VaultStatus::Running, "abort")?;
            if session.is_abort_armed(now) {
                reset(session, ctx);
                return Ok(vec![VaultNotice::Reset]);
            }
            session.abort_armed_at = Some(now);
            Ok(vec![VaultNotice::AbortArmed {
                expires_at: now + ABORT_CONFIRM_MS,
            }])
        }

        VaultAction::OpenWheel => {
            require_status(session, VaultStatus::Running, "open the wheel")?;
            if session.wheel.is_some() {
                return Err(VaultError::WheelUnavailable("already open"));
            }
            if session.game.is_cooling_down() {
                return Err(VaultError::WheelUnavailable("cooling down"));
            }
            if session.game.attempts_remaining == 0 {
                return Err(VaultError::WheelUnavailable("no attempts left"));
            }
            session.wheel = Some(WheelGame::new());
            Ok(vec![VaultNotice::WheelOpened])
        }

        VaultAction::SpinWheel => {
            let seed = session.game.entropy_seed;
            let wheel = session
                .wheel
                .as_mut()
                .ok_or(VaultError::WheelUnavailable("not open"))?;
            let spin = wheel.spin(seed, now)?;
            Ok(vec![VaultNotice::SpinStarted {
                stop_angle: spin.stop_angle,
                target_rotation: spin.target_rotation,
            }])
        }

        VaultAction::CloseWheel => {
            let Some(wheel) = session.wheel.as_ref() else {
                return Ok(Vec::new());
            };
            match wheel.phase {
                WheelPhase::Spinning(_) => Err(VaultError::SpinInProgress),
                // Outcome is already decided; closing just skips the hold.
                WheelPhase::Landed { sector, .. } => Ok(settle_wheel(session, sector, now)),
                WheelPhase::Idle => {
                    session.wheel = None;
                    Ok(vec![VaultNotice::WheelClosed])
                }
            }
        }

        VaultAction::Reset => {
            reset(session, ctx);
            Ok(vec![VaultNotice::Reset])
        }
    }
}

/// Apply `action` to a copy of `session`, returning the new session
pub fn transition(
    session: &VaultSession,
    action: VaultAction,
    ctx: &TickContext,
) -> Result<(VaultSession, Vec<VaultNotice>)> {
    let mut next = session.clone();
    let notices = apply(&mut next, action, ctx)?;
    Ok((next, notices))
}

/// One frame of the countdown loop
pub fn tick_countdown(session: &mut VaultSession, now: u64) -> Vec<VaultNotice> {
    let mut notices = Vec::new();

    if session.game.refresh_cooldown(now) {
        log::info!("Wheel cooldown over, attempts restored");
        notices.push(VaultNotice::CooldownCleared);
    }

    if session.abort_armed_at.is_some() && !session.is_abort_armed(now) {
        session.abort_armed_at = None;
        notices.push(VaultNotice::AbortDisarmed);
    }

    if session.status != VaultStatus::Running {
        return notices;
    }

    let remaining = remaining_ms(session.end_ms, now);
    session.time_left_ms = remaining;

    if remaining == 0 {
        session.status = VaultStatus::Revealed;
        session.abort_armed_at = None;
        if session.wheel.take().is_some() {
            notices.push(VaultNotice::WheelClosed);
        }
        log::info!("Countdown finished, revealing '{}'", session.file_name);
        notices.push(VaultNotice::Revealed);
    }

    notices
}

/// One frame of the wheel animation loop
pub fn tick_wheel(session: &mut VaultSession, now: u64) -> Vec<VaultNotice> {
    let Some(wheel) = session.wheel.as_mut() else {
        return Vec::new();
    };
    match wheel.advance(now) {
        WheelUpdate::Unchanged | WheelUpdate::Turning(_) => Vec::new(),
        WheelUpdate::Landed(sector) => {
            log::info!("Wheel landed on {}", SECTORS[sector].label);
            vec![VaultNotice::SpinLanded { sector }]
        }
        WheelUpdate::Settle(sector) => settle_wheel(session, sector, now),
    }
}

fn require_status(
    session: &VaultSession,
    status: VaultStatus,
    action: &'static str,
) -> Result<()> {
    if session.status != status {
        return Err(VaultError::invalid_state(action, session.status));
    }
    Ok(())
}

fn export(
    session: &VaultSession,
    seconds: u64,
    kind: BackupKind,
    now: u64,
) -> Result<BackupArtifact> {
    let image = session.image.as_ref().ok_or(VaultError::NoImage)?;
    let payload = BackupPayload::new(
        session.file_name.clone(),
        seconds,
        image.as_str(),
        &session.game,
    );
    let artifact = backup::encode(&payload, kind, now)?;
    log::info!(
        "Backup {} prepared ({} s, {} bytes)",
        artifact.file_name,
        seconds,
        artifact.bytes.len()
    );
    Ok(artifact)
}

fn restore(session: &mut VaultSession, payload: BackupPayload, fresh_seed: i64) -> VaultNotice {
    let file_name = if payload.file_name.is_empty() {
        UNKNOWN_FILE_NAME.to_string()
    } else {
        payload.file_name
    };
    let game = payload
        .game
        .map(|g| g.to_game_state(fresh_seed))
        .unwrap_or_else(|| GameState::new(fresh_seed));

    session.image = Some(ImageData::from_encoded(payload.image_data));
    session.file_name = file_name.clone();
    session.duration = DurationInput::from_total_seconds(payload.duration_seconds);
    session.game = game;
    session.time_locked = true;
    session.has_downloaded_backup = true;
    session.backup_warning = false;
    session.status = VaultStatus::Ready;
    session.mode = VaultMode::New;

    log::info!(
        "Restored '{}' ({} s, {} attempts left)",
        file_name,
        payload.duration_seconds,
        game.attempts_remaining
    );
    VaultNotice::Restored {
        file_name,
        duration_seconds: payload.duration_seconds,
    }
}

/// Countdown end for a `seconds` long run starting at `now`. Durations whose
/// end does not fit the clock are rejected rather than wrapped.
fn end_time(seconds: u64, now: u64) -> Result<u64> {
    seconds
        .checked_mul(1000)
        .and_then(|ms| now.checked_add(ms))
        .ok_or(VaultError::InvalidDuration)
}

fn start_timer(session: &mut VaultSession, end_ms: u64, now: u64) -> VaultNotice {
    session.end_ms = end_ms;
    session.time_left_ms = end_ms - now;
    session.status = VaultStatus::Running;
    session.abort_armed_at = None;
    session.backup_warning = false;
    log::info!("Countdown started: {} s", session.time_left_ms / 1000);
    VaultNotice::Started {
        end_ms: session.end_ms,
    }
}

fn reset(session: &mut VaultSession, ctx: &TickContext) {
    *session = VaultSession::new(ctx.fresh_seed, ctx.default_duration);
    log::info!("Vault reset");
}

fn settle_wheel(session: &mut VaultSession, sector: usize, now: u64) -> Vec<VaultNotice> {
    let outcome = &SECTORS[sector];
    session.end_ms = session.end_ms.saturating_add_signed(outcome.delta_ms);
    session.game.record_spin(now);
    session.wheel = None;

    log::info!(
        "Wheel applied {} ({} attempts left)",
        outcome.label,
        session.game.attempts_remaining
    );

    let mut notices = vec![VaultNotice::SpinSettled {
        sector,
        delta_ms: outcome.delta_ms,
        attempts_remaining: session.game.attempts_remaining,
    }];
    if session.game.is_cooling_down() {
        notices.push(VaultNotice::CooldownStarted {
            until_ms: session.game.cooldown_end_ms,
        });
    }
    notices.push(VaultNotice::WheelClosed);
    notices
}
