//! Self-contained image data
//!
//! Images are kept as `data:` URLs so they can be shown directly by a browser
//! and embedded verbatim in backups.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// An image encoded as a `data:{mime};base64,...` URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Encode raw file bytes, refusing anything over `limit` bytes
    pub fn from_bytes(bytes: &[u8], mime: &str, limit: usize) -> Result<Self> {
        if bytes.len() > limit {
            return Err(VaultError::ImageTooLarge {
                size: bytes.len(),
                limit,
            });
        }
        let encoded = general_purpose::STANDARD.encode(bytes);
        Ok(Self(format!("data:{};base64,{}", mime, encoded)))
    }

    /// Wrap an already-encoded string (e.g. from a backup)
    pub fn from_encoded(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Size of the encoded form
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// MIME type from the data URL header, if present
    pub fn mime(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let header = rest.split(',').next()?;
        header.split(';').next().filter(|m| !m.is_empty())
    }

    /// Decode the payload back to raw bytes. Only base64 data URLs carry
    /// binary content; anything else yields `None`.
    pub fn decode_bytes(&self) -> Option<Vec<u8>> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, body) = rest.split_once(',')?;
        if !header.ends_with(";base64") {
            return None;
        }
        general_purpose::STANDARD.decode(body).ok()
    }
}

/// Best-effort MIME type from a file name's extension
pub fn mime_for_file_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// File extension for a MIME type, used when writing a revealed image
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip() {
        let bytes = [0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        let image = ImageData::from_bytes(&bytes, "image/png", 1024).unwrap();
        assert!(image.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(image.mime(), Some("image/png"));
        assert_eq!(image.decode_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_size_limit() {
        let err = ImageData::from_bytes(&[0u8; 11], "image/png", 10).unwrap_err();
        assert!(matches!(err, VaultError::ImageTooLarge { size: 11, limit: 10 }));
    }

    #[test]
    fn test_non_base64_urls_do_not_decode() {
        let image = ImageData::from_encoded("data:text/plain,hello");
        assert_eq!(image.mime(), Some("text/plain"));
        assert!(image.decode_bytes().is_none());
        assert!(ImageData::from_encoded("not a url").decode_bytes().is_none());
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(mime_for_file_name("cat.JPG"), "image/jpeg");
        assert_eq!(mime_for_file_name("photo.png"), "image/png");
        assert_eq!(mime_for_file_name("README"), "application/octet-stream");
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
    }
}
