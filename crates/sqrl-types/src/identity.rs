use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ValidationError;

/// An owned, mutable UTF-8 buffer for key material and identifiers.
///
/// The bytes live in a single heap allocation that this type controls, so
/// they can be overwritten in place with [`Zeroize`]. Reading goes through
/// [`SensitiveString::as_str`]; there is no `Display` impl, and `Debug` only
/// prints the length. The buffer is zeroed on drop.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SensitiveString {
    bytes: Vec<u8>,
}

impl SensitiveString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            bytes: value.into().into_bytes(),
        }
    }

    /// Borrow the contents as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ever built from a `String` and only ever mutated by zeroize,
        // which leaves an empty buffer, so the bytes are always valid UTF-8.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Zeroize for SensitiveString {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}

impl Drop for SensitiveString {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl ZeroizeOnDrop for SensitiveString {}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<[u8]> for SensitiveString {
    fn borrow(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveString(<{} bytes>)", self.bytes.len())
    }
}

impl Serialize for SensitiveString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SensitiveString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// The user's last answer to an optional interactive prompt (0 = none, 1-3 =
/// the button pressed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ButtonResponse(u8);

impl ButtonResponse {
    pub const MAX: u8 = 3;

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::InvalidButtonResponse(i64::from(value)));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ButtonResponse {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for ButtonResponse {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| ValidationError::InvalidButtonResponse(value))
            .and_then(Self::new)
    }
}

impl From<ButtonResponse> for u8 {
    fn from(value: ButtonResponse) -> Self {
        value.0
    }
}

/// One user's per-site public-key credential.
///
/// Sensitivity classes:
/// - critical: `unlock_key`, `verify_key`
/// - sensitive: `primary_id`, `previous_id`, `rotated_to_id`
/// - non-sensitive: the three flags and `button_response`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Record key. Never reassigned once the record exists.
    pub primary_id: SensitiveString,
    pub unlock_key: SensitiveString,
    pub verify_key: SensitiveString,
    /// Identifier this one replaced, set only while rotating.
    pub previous_id: Option<SensitiveString>,
    /// Server policy: alternate login methods are disabled.
    pub sole_auth: bool,
    /// Cleared only by an explicit unlock ceremony.
    pub hard_lock: bool,
    pub disabled: bool,
    /// Soft reference to the newer identity's `primary_id`. Not checked for
    /// existence.
    pub rotated_to_id: Option<SensitiveString>,
    pub button_response: ButtonResponse,
}

impl Identity {
    /// Create an identity with all flags cleared and no rotation links.
    pub fn new(
        primary_id: impl Into<SensitiveString>,
        unlock_key: impl Into<SensitiveString>,
        verify_key: impl Into<SensitiveString>,
    ) -> Self {
        Self {
            primary_id: primary_id.into(),
            unlock_key: unlock_key.into(),
            verify_key: verify_key.into(),
            previous_id: None,
            sole_auth: false,
            hard_lock: false,
            disabled: false,
            rotated_to_id: None,
            button_response: ButtonResponse::default(),
        }
    }
}
