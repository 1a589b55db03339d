//! Time Vault - a time-locked image vault with a fate wheel
//!
//! Core modules:
//! - `vault`: Session state machine and the controller that drives it
//! - `backup`: Obfuscated backup artifacts (export/import)
//! - `countdown`: Per-frame countdown stepping and clock formatting
//! - `wheel`: Deterministic fate wheel mini-game
//! - `platform`: Wall clock and cancellable frame loops
//! - `image`: Self-contained image data URLs
//! - `settings`: Persisted user preferences

pub mod backup;
pub mod countdown;
pub mod error;
pub mod image;
pub mod platform;
pub mod settings;
pub mod vault;
pub mod wheel;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use backup::{BackupArtifact, BackupKind, BackupPayload};
pub use error::{IntegrityError, Result, VaultError};
pub use settings::VaultSettings;
pub use vault::{Vault, VaultAction, VaultNotice, VaultSession, VaultStatus};

/// Vault configuration constants
pub mod consts {
    /// Spins allowed before the wheel goes on cooldown
    pub const MAX_ATTEMPTS: u8 = 5;
    /// Wheel cooldown once all attempts are spent (1 hour)
    pub const COOLDOWN_MS: u64 = 60 * 60 * 1000;

    /// Window in which a second abort press confirms the abort
    pub const ABORT_CONFIRM_MS: u64 = 3000;

    /// Wheel spin animation length
    pub const SPIN_DURATION_MS: u64 = 5000;
    /// Full turns added on top of the stop angle
    pub const SPIN_TURNS: f64 = 5.0;
    /// How long a landed result is shown before it is applied
    pub const RESULT_HOLD_MS: u64 = 1500;

    /// Fresh entropy seeds are drawn from [0, SEED_RANGE)
    pub const SEED_RANGE: i64 = 1_000_000;

    /// Name used when a restored backup carries no file name
    pub const UNKNOWN_FILE_NAME: &str = "UNKNOWN_DATA";
}
