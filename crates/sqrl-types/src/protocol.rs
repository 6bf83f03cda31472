//! The identity shape exchanged with the SQRL protocol handler.
//!
//! The protocol handler works with plain strings and the short field names
//! used on the wire (`idk`, `suk`, `vuk`, ...). [`ProtocolIdentity`] mirrors
//! that shape; the conversions to and from [`Identity`] are pure and are the
//! only place the two shapes meet.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ValidationError;
use crate::identity::{ButtonResponse, Identity, SensitiveString};

/// Plain-string identity record as the protocol handler sees it.
///
/// Empty `pidk` / `rekeyed` strings are treated the same as absent ones.
/// The struct zeroes its strings on drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ProtocolIdentity {
    pub idk: String,
    pub suk: String,
    pub vuk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pidk: Option<String>,
    #[serde(default, rename = "sqrlonly")]
    pub sqrl_only: bool,
    #[serde(default)]
    pub hardlock: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rekeyed: Option<String>,
    #[serde(default)]
    pub btn: i64,
}

fn non_empty(value: Option<String>) -> Option<SensitiveString> {
    value.filter(|s| !s.is_empty()).map(SensitiveString::new)
}

impl From<&Identity> for ProtocolIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            idk: identity.primary_id.as_str().to_owned(),
            suk: identity.unlock_key.as_str().to_owned(),
            vuk: identity.verify_key.as_str().to_owned(),
            pidk: identity.previous_id.as_ref().map(|s| s.as_str().to_owned()),
            sqrl_only: identity.sole_auth,
            hardlock: identity.hard_lock,
            disabled: identity.disabled,
            rekeyed: identity.rotated_to_id.as_ref().map(|s| s.as_str().to_owned()),
            btn: i64::from(identity.button_response.get()),
        }
    }
}

impl TryFrom<ProtocolIdentity> for Identity {
    type Error = ValidationError;

    fn try_from(mut value: ProtocolIdentity) -> Result<Self, Self::Error> {
        let button_response = ButtonResponse::try_from(value.btn)?;

        // Move the allocations across instead of copying them; whatever is
        // left in `value` is zeroed when it drops.
        Ok(Identity {
            primary_id: SensitiveString::new(std::mem::take(&mut value.idk)),
            unlock_key: SensitiveString::new(std::mem::take(&mut value.suk)),
            verify_key: SensitiveString::new(std::mem::take(&mut value.vuk)),
            previous_id: non_empty(value.pidk.take()),
            sole_auth: value.sqrl_only,
            hard_lock: value.hardlock,
            disabled: value.disabled,
            rotated_to_id: non_empty(value.rekeyed.take()),
            button_response,
        })
    }
}
