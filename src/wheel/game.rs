//! Wheel attempt bookkeeping and the open wheel overlay

use serde::{Deserialize, Serialize};

use super::rng::Lcg;
use super::sector::{SECTORS, WheelSector, sector_for_rotation};
use super::spin::SpinAnimation;
use crate::consts::{COOLDOWN_MS, MAX_ATTEMPTS, RESULT_HOLD_MS};
use crate::error::{Result, VaultError};

/// Persistent mini-game state (travels inside backups)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub attempts_remaining: u8,
    /// Epoch ms when spinning unlocks again, 0 when not cooling down
    pub cooldown_end_ms: u64,
    pub entropy_seed: i64,
}

impl GameState {
    pub fn new(entropy_seed: i64) -> Self {
        Self {
            attempts_remaining: MAX_ATTEMPTS,
            cooldown_end_ms: 0,
            entropy_seed,
        }
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_end_ms > 0
    }

    pub fn can_play(&self) -> bool {
        !self.is_cooling_down() && self.attempts_remaining > 0
    }

    pub fn cooldown_remaining_ms(&self, now: u64) -> u64 {
        if self.is_cooling_down() {
            self.cooldown_end_ms.saturating_sub(now)
        } else {
            0
        }
    }

    /// Restore attempts once the cooldown has passed. Returns true if it did.
    pub fn refresh_cooldown(&mut self, now: u64) -> bool {
        if self.is_cooling_down() && now > self.cooldown_end_ms {
            self.cooldown_end_ms = 0;
            self.attempts_remaining = MAX_ATTEMPTS;
            return true;
        }
        false
    }

    /// Book a completed spin: spend an attempt, start the cooldown on the
    /// last one, and move the seed on so the next spin differs
    pub fn record_spin(&mut self, now: u64) {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            self.cooldown_end_ms = now + COOLDOWN_MS;
        }
        self.entropy_seed = Lcg::advance_seed(self.entropy_seed);
    }

    /// Short fingerprint of the seed for display
    pub fn seed_tag(&self) -> i64 {
        self.entropy_seed.rem_euclid(9999)
    }
}

/// Overlay phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WheelPhase {
    /// Open, waiting for the spin button
    Idle,
    /// Spin in flight; cannot be cancelled
    Spinning(SpinAnimation),
    /// Stopped on a sector; applied once the result hold elapses
    Landed { sector: usize, landed_at: u64 },
}

/// What a frame did to the wheel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelUpdate {
    Unchanged,
    Turning(f64),
    Landed(usize),
    /// Result hold is over, apply this sector
    Settle(usize),
}

/// The open fate wheel overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelGame {
    /// Current rotation in degrees (grows across the spin)
    pub rotation: f64,
    pub phase: WheelPhase,
}

impl Default for WheelGame {
    fn default() -> Self {
        Self::new()
    }
}

impl WheelGame {
    pub fn new() -> Self {
        Self {
            rotation: 0.0,
            phase: WheelPhase::Idle,
        }
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, WheelPhase::Spinning(_))
    }

    pub fn landed_sector(&self) -> Option<&'static WheelSector> {
        match self.phase {
            WheelPhase::Landed { sector, .. } => SECTORS.get(sector),
            _ => None,
        }
    }

    /// Start a spin whose stop angle is the first draw of `seed`
    pub fn spin(&mut self, seed: i64, now: u64) -> Result<SpinAnimation> {
        match self.phase {
            WheelPhase::Idle => {}
            WheelPhase::Spinning(_) => return Err(VaultError::SpinInProgress),
            WheelPhase::Landed { .. } => {
                return Err(VaultError::WheelUnavailable("result not yet applied"));
            }
        }

        let stop_angle = Lcg::new(seed).next_f64() * 360.0;
        let spin = SpinAnimation::new(now, self.rotation, stop_angle);
        self.phase = WheelPhase::Spinning(spin);
        Ok(spin)
    }

    /// Advance the overlay to `now`
    pub fn advance(&mut self, now: u64) -> WheelUpdate {
        match self.phase {
            WheelPhase::Idle => WheelUpdate::Unchanged,
            WheelPhase::Spinning(spin) => {
                self.rotation = spin.rotation_at(now);
                if spin.is_finished(now) {
                    let sector = sector_for_rotation(spin.target_rotation);
                    self.phase = WheelPhase::Landed {
                        sector,
                        landed_at: now,
                    };
                    WheelUpdate::Landed(sector)
                } else {
                    WheelUpdate::Turning(self.rotation)
                }
            }
            WheelPhase::Landed { sector, landed_at } => {
                if now.saturating_sub(landed_at) >= RESULT_HOLD_MS {
                    WheelUpdate::Settle(sector)
                } else {
                    WheelUpdate::Unchanged
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SPIN_DURATION_MS;

    #[test]
    fn test_five_spins_start_cooldown() {
        let mut game = GameState::new(777);
        let now = 10_000;
        for _ in 0..MAX_ATTEMPTS {
            assert!(game.can_play());
            game.record_spin(now);
        }
        assert_eq!(game.attempts_remaining, 0);
        assert!(game.cooldown_end_ms > now);
        assert!(!game.can_play());

        assert!(!game.refresh_cooldown(game.cooldown_end_ms));
        assert!(game.refresh_cooldown(game.cooldown_end_ms + 1));
        assert_eq!(game.attempts_remaining, MAX_ATTEMPTS);
        assert_eq!(game.cooldown_end_ms, 0);
    }

    #[test]
    fn test_record_spin_moves_seed() {
        let mut game = GameState::new(12345);
        game.record_spin(0);
        assert_eq!(game.entropy_seed, 207_482_415);
        assert_eq!(game.attempts_remaining, MAX_ATTEMPTS - 1);
        assert_eq!(game.cooldown_end_ms, 0);
    }

    #[test]
    fn test_seed_12345_lands_on_plus_one_minute() {
        let mut wheel = WheelGame::new();
        let spin = wheel.spin(12345, 0).unwrap();
        assert!((spin.stop_angle - 34.78).abs() < 0.01);

        assert!(matches!(wheel.advance(SPIN_DURATION_MS / 2), WheelUpdate::Turning(_)));
        assert_eq!(wheel.advance(SPIN_DURATION_MS), WheelUpdate::Landed(3));
        assert_eq!(wheel.landed_sector().unwrap().label, "+1 min");
        assert_eq!(wheel.advance(SPIN_DURATION_MS + 100), WheelUpdate::Unchanged);
        assert_eq!(
            wheel.advance(SPIN_DURATION_MS + RESULT_HOLD_MS),
            WheelUpdate::Settle(3)
        );
    }

    #[test]
    fn test_spin_cannot_restart_mid_flight() {
        let mut wheel = WheelGame::new();
        wheel.spin(1, 0).unwrap();
        assert!(wheel.is_spinning());
        assert!(matches!(wheel.spin(1, 10), Err(VaultError::SpinInProgress)));
    }

    #[test]
    fn test_same_seed_same_landing() {
        let land = |seed| {
            let mut wheel = WheelGame::new();
            wheel.spin(seed, 0).unwrap();
            wheel.advance(SPIN_DURATION_MS)
        };
        for seed in [1, 99, 31337, 999_999] {
            assert_eq!(land(seed), land(seed));
        }
    }
}
