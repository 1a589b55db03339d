//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Per-frame loop handles (requestAnimationFrame on web, sleep loop natively)

pub mod clock;
pub mod frame;

pub use clock::{Clock, ManualClock, SystemClock};
pub use frame::FrameHandle;
