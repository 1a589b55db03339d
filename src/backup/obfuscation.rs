//! Reversible byte obfuscation for backup artifacts
//!
//! XOR with a repeating key that ships with the application, then base64.
//! Anyone holding the binary can undo it: this keeps casual eyes off the
//! payload and nothing more.

use base64::{Engine as _, engine::general_purpose};

use crate::error::IntegrityError;

/// Shared key baked into every build
pub const SHARED_KEY: &[u8] = b"OMEGA-PROTOCOL-V2-BINDING-KEY-9923-X";

/// XOR `data` in place with the repeating key
pub fn xor_in_place(data: &mut [u8], key: &[u8]) {
    if key.is_empty() {
        return;
    }
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % key.len()];
    }
}

/// Obfuscate plaintext into base64 text
pub fn obfuscate(plain: &[u8]) -> String {
    let mut bytes = plain.to_vec();
    xor_in_place(&mut bytes, SHARED_KEY);
    general_purpose::STANDARD.encode(bytes)
}

/// Undo [`obfuscate`]. Surrounding whitespace is ignored.
pub fn deobfuscate(encoded: &[u8]) -> Result<Vec<u8>, IntegrityError> {
    let trimmed = encoded.trim_ascii();
    let mut bytes = general_purpose::STANDARD.decode(trimmed)?;
    xor_in_place(&mut bytes, SHARED_KEY);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_is_an_involution() {
        let original = b"{\"v\":6}".to_vec();
        let mut data = original.clone();
        xor_in_place(&mut data, SHARED_KEY);
        assert_ne!(data, original);
        xor_in_place(&mut data, SHARED_KEY);
        assert_eq!(data, original);
    }

    #[test]
    fn test_key_repeats_past_its_length() {
        let mut data = vec![0u8; SHARED_KEY.len() * 2 + 3];
        xor_in_place(&mut data, SHARED_KEY);
        assert_eq!(&data[..SHARED_KEY.len()], SHARED_KEY);
        assert_eq!(&data[SHARED_KEY.len()..SHARED_KEY.len() * 2], SHARED_KEY);
        assert_eq!(&data[SHARED_KEY.len() * 2..], &SHARED_KEY[..3]);
    }

    #[test]
    fn test_deobfuscate_tolerates_trailing_newline() {
        let mut text = obfuscate(b"hello vault").into_bytes();
        text.push(b'\n');
        assert_eq!(deobfuscate(&text).unwrap(), b"hello vault");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            deobfuscate(b"!!not base64!!"),
            Err(IntegrityError::Encoding(_))
        ));
    }
}
