//! Backup artifacts
//!
//! Features:
//! - Versioned JSON payload with compact wire keys
//! - Obfuscated with the shared key (not encryption, see `obfuscation`)
//! - Full exports (`SECURE_DATA_*`) and mid-run snapshots (`MID_RUN_SAVE_*`)
//! - Structural validation on import; nothing is applied unless it passes

pub mod obfuscation;

use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::MAX_ATTEMPTS;
use crate::error::{IntegrityError, Result};
use crate::wheel::GameState;

/// Payload version written by this build
pub const PAYLOAD_VERSION: u32 = 6;
/// Extension of every backup artifact
pub const ARTIFACT_EXTENSION: &str = "krypton";
/// MIME type the artifact is offered with
pub const ARTIFACT_MIME: &str = "application/octet-stream";

/// Which kind of export produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupKind {
    /// Export of the configured vault before it starts
    Full,
    /// Snapshot of a running vault with its remaining time
    MidRun,
}

impl BackupKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            BackupKind::Full => "SECURE_DATA",
            BackupKind::MidRun => "MID_RUN_SAVE",
        }
    }

    /// `{PREFIX}_{epochMs}.krypton`
    pub fn file_name(&self, now_ms: u64) -> String {
        format!("{}_{}.{}", self.prefix(), now_ms, ARTIFACT_EXTENSION)
    }
}

/// Mini-game state as stored in a backup. Every field is optional so older
/// or hand-edited payloads still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(rename = "att", alias = "attempts", default)]
    /// Any integer is accepted; it is clamped to `0..=MAX_ATTEMPTS` on load
    pub attempts: Option<i64>,
    #[serde(rename = "cd", alias = "cooldownEnd", default)]
    pub cooldown_end: Option<u64>,
    #[serde(default)]
    pub seed: Option<i64>,
}

impl From<&GameState> for GameSnapshot {
    fn from(game: &GameState) -> Self {
        Self {
            attempts: Some(i64::from(game.attempts_remaining)),
            cooldown_end: Some(game.cooldown_end_ms),
            seed: Some(game.entropy_seed),
        }
    }
}

impl GameSnapshot {
    /// Fill gaps with a fresh game: 5 attempts, no cooldown, `fresh_seed`
    pub fn to_game_state(&self, fresh_seed: i64) -> GameState {
        GameState {
            attempts_remaining: self
                .attempts
                .map_or(MAX_ATTEMPTS, |n| n.clamp(0, i64::from(MAX_ATTEMPTS)) as u8),
            cooldown_end_ms: self.cooldown_end.unwrap_or(0),
            entropy_seed: self.seed.unwrap_or(fresh_seed),
        }
    }
}

/// Everything needed to rebuild a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPayload {
    #[serde(rename = "v", alias = "version", default)]
    pub version: u32,
    #[serde(
        rename = "n",
        alias = "fileName",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub file_name: String,
    #[serde(rename = "duration", alias = "durationSeconds", default)]
    pub duration_seconds: u64,
    #[serde(
        rename = "d",
        alias = "imageData",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub image_data: String,
    #[serde(
        rename = "g",
        alias = "gameState",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub game: Option<GameSnapshot>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl BackupPayload {
    pub fn new(
        file_name: impl Into<String>,
        duration_seconds: u64,
        image_data: impl Into<String>,
        game: &GameState,
    ) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            file_name: file_name.into(),
            duration_seconds,
            image_data: image_data.into(),
            game: Some(GameSnapshot::from(game)),
        }
    }

    /// Reject payloads that cannot rebuild a vault
    pub fn validate(&self) -> std::result::Result<(), IntegrityError> {
        if self.image_data.is_empty() {
            return Err(IntegrityError::MissingField("imageData"));
        }
        if self.duration_seconds == 0 {
            return Err(IntegrityError::MissingField("durationSeconds"));
        }
        Ok(())
    }
}

/// A ready-to-save backup file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub kind: BackupKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl BackupArtifact {
    pub fn mime(&self) -> &'static str {
        ARTIFACT_MIME
    }
}

/// Serialize and obfuscate `payload` into a downloadable artifact
pub fn encode(payload: &BackupPayload, kind: BackupKind, now_ms: u64) -> Result<BackupArtifact> {
    let json = serde_json::to_string(payload).map_err(IntegrityError::from)?;
    let text = obfuscation::obfuscate(json.as_bytes());
    Ok(BackupArtifact {
        kind,
        file_name: kind.file_name(now_ms),
        bytes: text.into_bytes(),
    })
}

/// Undo [`encode`] and check the payload is usable
pub fn decode(bytes: &[u8]) -> std::result::Result<BackupPayload, IntegrityError> {
    let plain = obfuscation::deobfuscate(bytes)?;
    let json = String::from_utf8(plain)?;
    let payload: BackupPayload = serde_json::from_str(&json)?;
    payload.validate()?;
    Ok(payload)
}
