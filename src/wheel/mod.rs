//! Fate wheel mini-game
//!
//! Everything here is deterministic given the entropy seed:
//! - Park-Miller LCG picks the stop angle
//! - Fixed sector table maps the landing angle to a time delta
//! - Spin animation is a pure function of (start time, now)

pub mod game;
pub mod rng;
pub mod sector;
pub mod spin;

pub use game::{GameState, WheelGame, WheelPhase};
pub use rng::Lcg;
pub use sector::{SECTORS, WheelSector, pointer_angle, sector_at, sector_for_rotation};
pub use spin::{SpinAnimation, ease_out_cubic};
