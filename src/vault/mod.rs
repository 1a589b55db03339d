//! Vault session state machine
//!
//! `state` holds the session, `tick` the transitions. [`Vault`] wraps both
//! with the side effects they need: the clock, a source of fresh seeds and
//! the frame loop handles for the countdown and the wheel.

pub mod state;
pub mod tick;

pub use state::{DurationInput, VaultMode, VaultSession, VaultStatus};
pub use tick::{
    TickContext, VaultAction, VaultNotice, apply, tick_countdown, tick_wheel, transition,
};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::SEED_RANGE;
use crate::countdown::CountdownDriver;
use crate::error::Result;
use crate::platform::{Clock, FrameHandle, SystemClock};
use crate::settings::VaultSettings;
use crate::wheel::WheelPhase;

/// A vault plus everything needed to run it
pub struct Vault<C: Clock = SystemClock> {
    session: VaultSession,
    settings: VaultSettings,
    clock: C,
    rng: Pcg32,
    countdown: CountdownDriver,
    wheel_loop: Option<FrameHandle>,
}

impl Vault<SystemClock> {
    pub fn new(settings: VaultSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Vault<C> {
    /// Seed entropy from the clock
    pub fn with_clock(settings: VaultSettings, clock: C) -> Self {
        let seed = clock.now_ms();
        Self::with_rng_seed(settings, clock, seed)
    }

    /// Fully reproducible vault (fresh seeds come from `rng_seed`)
    pub fn with_rng_seed(settings: VaultSettings, clock: C, rng_seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(rng_seed);
        let entropy_seed = rng.random_range(0..SEED_RANGE);
        let session = VaultSession::new(entropy_seed, settings.default_duration);
        Self {
            session,
            settings,
            clock,
            rng,
            countdown: CountdownDriver::new(),
            wheel_loop: None,
        }
    }

    pub fn session(&self) -> &VaultSession {
        &self.session
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Swap in new preferences. They apply to the next reset or upload;
    /// a vault that is already running keeps its countdown.
    pub fn set_settings(&mut self, settings: VaultSettings) {
        log::info!("Settings updated");
        self.settings = settings;
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Handle of the running countdown loop, if any
    pub fn countdown_handle(&self) -> Option<FrameHandle> {
        self.countdown.handle().cloned()
    }

    /// Handle of the running wheel animation loop, if any
    pub fn wheel_handle(&self) -> Option<FrameHandle> {
        self.wheel_loop.clone().filter(FrameHandle::is_active)
    }

    /// True while either frame loop still has work to do
    pub fn has_active_loops(&self) -> bool {
        self.countdown.is_running() || self.wheel_handle().is_some()
    }

    fn context(&mut self) -> TickContext {
        TickContext {
            now_ms: self.clock.now_ms(),
            fresh_seed: self.rng.random_range(0..SEED_RANGE),
            default_duration: self.settings.default_duration,
        }
    }

    /// Apply a user action
    pub fn dispatch(&mut self, action: VaultAction) -> Result<Vec<VaultNotice>> {
        let name = action.name();
        let ctx = self.context();
        match apply(&mut self.session, action, &ctx) {
            Ok(notices) => {
                log::debug!("{} -> {:?}", name, self.session.status);
                self.sync_loops();
                Ok(notices)
            }
            Err(e) => {
                log::warn!("Refused to {}: {}", name, e);
                Err(e)
            }
        }
    }

    /// One frame of the countdown loop
    pub fn countdown_frame(&mut self) -> Vec<VaultNotice> {
        let now = self.clock.now_ms();
        let notices = self.countdown.step(&mut self.session, now);
        self.sync_loops();
        notices
    }

    /// One frame of the wheel animation loop
    pub fn wheel_frame(&mut self) -> Vec<VaultNotice> {
        if self.wheel_handle().is_none() {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let notices = tick_wheel(&mut self.session, now);
        self.sync_loops();
        notices
    }

    /// Run one frame of every active loop
    pub fn frame(&mut self) -> Vec<VaultNotice> {
        let mut notices = self.countdown_frame();
        notices.extend(self.wheel_frame());
        notices
    }

    /// Start or cancel frame loops to match the session
    fn sync_loops(&mut self) {
        let running = self.session.status == VaultStatus::Running;
        if running && !self.countdown.is_running() {
            self.countdown.start();
        } else if !running {
            self.countdown.stop();
        }

        let animating = self
            .session
            .wheel
            .as_ref()
            .is_some_and(|w| w.phase != WheelPhase::Idle);
        if animating {
            if self.wheel_handle().is_none() {
                self.wheel_loop = Some(FrameHandle::new("wheel"));
            }
        } else if let Some(handle) = self.wheel_loop.take() {
            handle.cancel();
        }
    }
}

impl<C: Clock> Drop for Vault<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.wheel_loop.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{RESULT_HOLD_MS, SPIN_DURATION_MS};
    use crate::image::ImageData;
    use crate::platform::ManualClock;

    const T0: u64 = 1_700_000_000_000;

    fn loaded_vault(clock: &ManualClock) -> Vault<&ManualClock> {
        let mut vault = Vault::with_rng_seed(VaultSettings::default(), clock, 7);
        vault
            .dispatch(VaultAction::UploadImage {
                file_name: "photo.jpg".into(),
                image: ImageData::from_encoded("data:image/jpeg;base64,/9j/"),
            })
            .unwrap();
        vault
    }

    #[test]
    fn test_fresh_seeds_are_reproducible() {
        let clock = ManualClock::new(T0);
        let a = Vault::with_rng_seed(VaultSettings::default(), &clock, 99);
        let b = Vault::with_rng_seed(VaultSettings::default(), &clock, 99);
        assert_eq!(a.session().game, b.session().game);
        assert!((0..SEED_RANGE).contains(&a.session().game.entropy_seed));
    }

    #[test]
    fn test_countdown_loop_follows_status() {
        let clock = ManualClock::new(T0);
        let mut vault = loaded_vault(&clock);
        assert!(vault.countdown_handle().is_none());

        vault.dispatch(VaultAction::ProceedWithoutBackup).unwrap();
        let handle = vault.countdown_handle().expect("countdown loop");
        assert!(handle.is_active());

        clock.advance(4_000);
        assert!(vault.frame().is_empty());
        assert_eq!(vault.session().time_left_ms, 6_000);

        clock.advance(6_000);
        let notices = vault.frame();
        assert_eq!(notices, vec![VaultNotice::Revealed]);
        assert_eq!(vault.session().status, VaultStatus::Revealed);
        assert!(!handle.is_active());
        assert!(!vault.has_active_loops());
    }

    #[test]
    fn test_reset_cancels_loops() {
        let clock = ManualClock::new(T0);
        let mut vault = loaded_vault(&clock);
        vault.dispatch(VaultAction::ProceedWithoutBackup).unwrap();
        let handle = vault.countdown_handle().unwrap();

        vault.dispatch(VaultAction::Reset).unwrap();
        assert!(!handle.is_active());
        assert_eq!(vault.session().status, VaultStatus::Idle);
    }

    #[test]
    fn test_drop_cancels_loops() {
        let clock = ManualClock::new(T0);
        let mut vault = loaded_vault(&clock);
        vault
            .dispatch(VaultAction::SetDuration(DurationInput::new(1, 0, 0)))
            .unwrap();
        vault.dispatch(VaultAction::ProceedWithoutBackup).unwrap();
        vault.dispatch(VaultAction::OpenWheel).unwrap();
        vault.dispatch(VaultAction::SpinWheel).unwrap();

        let countdown = vault.countdown_handle().unwrap();
        let wheel = vault.wheel_handle().unwrap();
        assert!(!countdown.same_loop(&wheel));

        drop(vault);
        assert!(!countdown.is_active());
        assert!(!wheel.is_active());
    }

    #[test]
    fn test_wheel_loop_runs_until_settled() {
        let clock = ManualClock::new(T0);
        let mut vault = loaded_vault(&clock);
        vault
            .dispatch(VaultAction::SetDuration(DurationInput::new(2, 0, 0)))
            .unwrap();
        vault.dispatch(VaultAction::ProceedWithoutBackup).unwrap();
        vault.dispatch(VaultAction::OpenWheel).unwrap();
        assert!(vault.wheel_handle().is_none());

        vault.dispatch(VaultAction::SpinWheel).unwrap();
        let wheel = vault.wheel_handle().unwrap();

        clock.advance(SPIN_DURATION_MS);
        let notices = vault.frame();
        assert!(matches!(notices.as_slice(), [VaultNotice::SpinLanded { .. }]));
        assert!(wheel.is_active());

        clock.advance(RESULT_HOLD_MS);
        let notices = vault.frame();
        assert!(notices.contains(&VaultNotice::WheelClosed));
        assert!(!wheel.is_active());
        assert_eq!(vault.session().game.attempts_remaining, 4);
        // Countdown keeps running independently
        assert!(vault.countdown_handle().is_some());
    }

    #[test]
    fn test_new_settings_apply_on_reset() {
        let clock = ManualClock::new(T0);
        let mut vault = loaded_vault(&clock);
        vault.dispatch(VaultAction::ProceedWithoutBackup).unwrap();

        vault.set_settings(VaultSettings {
            default_duration: DurationInput::new(0, 2, 0),
            show_hundredths: false,
            ..Default::default()
        });
        assert_eq!(vault.session().status, VaultStatus::Running);
        assert_eq!(vault.session().duration, DurationInput::default());
        assert_eq!(vault.settings().format_remaining(61_230), "00:01:01");

        vault.dispatch(VaultAction::Reset).unwrap();
        assert_eq!(vault.session().duration, DurationInput::new(0, 2, 0));
    }

    #[test]
    fn test_refused_action_keeps_session() {
        let clock = ManualClock::new(T0);
        let mut vault = loaded_vault(&clock);
        let before = vault.session().clone();
        assert!(vault.dispatch(VaultAction::Abort).is_err());
        assert_eq!(vault.session(), &before);
    }
}
