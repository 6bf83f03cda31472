//! Input checks run before every storage operation: identifier format and
//! presence of key material.
//!
//! Pure and deterministic: no I/O, no allocation, no normalization. Anything
//! outside the allowed alphabet is rejected outright, including look-alike
//! characters such as zero-width spaces, bidi override marks, and byte-order
//! marks.

use sqrl_types::error::ValidationError;
use sqrl_types::identity::Identity;

/// Maximum identifier length, counted in code points.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// Standard and URL-safe base64 alphabets plus padding and `.`.
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '-' | '_' | '.')
}

/// Check an identifier. Rules apply in order and the first failure wins:
/// empty, then too long, then a disallowed character.
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::KeyTooLong);
    }
    if !value.chars().all(is_allowed) {
        return Err(ValidationError::InvalidFormat);
    }
    Ok(())
}

/// A record is only storable with both keys present.
pub fn validate_key_material(identity: &Identity) -> Result<(), ValidationError> {
    if identity.unlock_key.is_empty() || identity.verify_key.is_empty() {
        return Err(ValidationError::MissingKeyMaterial);
    }
    Ok(())
}
