//! Best-effort wiping of sensitive buffers.
//!
//! [`wipe`] goes through [`zeroize`], which writes with volatile stores
//! followed by a compiler fence, so the zeroing survives dead-store
//! elimination even when the buffer is freed right afterwards.
//!
//! # Non-guarantee
//!
//! Only the buffer passed in is cleared. Copies made before the call are
//! untouched: bytes the database driver kept in its own row buffers,
//! `String`s produced by [`ProtocolIdentity`](sqrl_types::protocol::ProtocolIdentity)
//! conversions, clones of an [`Identity`], formatting output, or old
//! allocations left behind when a `Vec` grew. Wiping shortens the time key
//! material stays resident; it does not prove that no copy exists.

use sqrl_types::identity::{Identity, SensitiveString};
use zeroize::Zeroize;

/// Overwrite every byte of `buffer` with zero.
///
/// For growable buffers (`Vec<u8>`, [`SensitiveString`]) the spare capacity
/// is zeroed too and the length is reset to 0.
pub fn wipe<B: Zeroize + ?Sized>(buffer: &mut B) {
    buffer.zeroize();
}

fn wipe_optional(field: &mut Option<SensitiveString>) {
    if let Some(value) = field.as_mut() {
        wipe(value);
    }
    *field = None;
}

/// Wipe every sensitive and critical field of `identity` and reset it to its
/// empty value. Flags and the button response are left as they are.
pub fn wipe_identity(identity: &mut Identity) {
    wipe(&mut identity.unlock_key);
    wipe(&mut identity.verify_key);
    wipe_optional(&mut identity.previous_id);
    wipe_optional(&mut identity.rotated_to_id);
    wipe(&mut identity.primary_id);
}
