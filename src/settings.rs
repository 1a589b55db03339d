//! Vault settings and preferences
//!
//! Persisted in LocalStorage on the web and as a JSON file natively. Never
//! part of a backup.

use serde::{Deserialize, Serialize};

use crate::vault::DurationInput;

/// Default image size cap (raw bytes)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

/// Vault settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Duration a fresh vault starts with
    pub default_duration: DurationInput,
    /// Largest image accepted on upload
    pub max_image_bytes: usize,

    // === Native loop ===
    /// Sleep between frames in the terminal front-end
    pub frame_interval_ms: u64,
    /// Where exported backups and revealed images are written
    pub export_dir: String,

    // === Display ===
    /// Show hundredths of a second in the countdown
    pub show_hundredths: bool,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            default_duration: DurationInput::default(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,

            // ~60 fps
            frame_interval_ms: 16,
            export_dir: ".".to_string(),

            show_hundredths: true,
        }
    }
}

impl VaultSettings {
    /// Format a remaining time according to the display settings
    pub fn format_remaining(&self, ms: u64) -> String {
        let display = crate::countdown::ClockDisplay::from_ms(ms);
        if self.show_hundredths {
            display.to_string()
        } else {
            format!(
                "{:02}:{:02}:{:02}",
                display.hours, display.minutes, display.seconds
            )
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "time_vault_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> crate::Result<Self> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json).map_err(|e| {
            crate::VaultError::settings(format!("{}: {}", path.display(), e))
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::VaultError::settings(e.to_string()))?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
