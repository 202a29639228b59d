//! Protected values and their transient conversion to plaintext.

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use crate::config::ConfigError;

/// An opaque host-managed secret, stored as UTF-16 code units.
///
/// The backing buffer is zeroed when the value is dropped and the contents
/// never appear in `Debug` output.
pub struct ProtectedString {
    units: Zeroizing<Vec<u16>>,
}

impl ProtectedString {
    pub fn from_plaintext(plaintext: &str) -> Self {
        // Sized up front so collecting never leaves a grown-out copy behind.
        let mut units = Vec::with_capacity(plaintext.encode_utf16().count());
        units.extend(plaintext.encode_utf16());
        Self::from_utf16(units)
    }

    /// Takes ownership of raw code units, which need not be valid UTF-16.
    pub fn from_utf16(units: Vec<u16>) -> Self {
        Self {
            units: Zeroizing::new(units),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for ProtectedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProtectedString(***)")
    }
}

/// Scratch copy of a secret's plaintext, wiped on drop.
struct PlaintextBuffer {
    units: Vec<u16>,
}

impl PlaintextBuffer {
    fn copy_from(secret: &ProtectedString) -> Self {
        Self {
            units: secret.units.to_vec(),
        }
    }

    fn as_slice(&self) -> &[u16] {
        &self.units
    }

    fn wipe(&mut self) {
        self.units.as_mut_slice().zeroize();
    }
}

impl Drop for PlaintextBuffer {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// Returns the plaintext of a protected value for APIs that need a `String`.
///
/// An absent handle fails with [`ConfigError::NullSecret`] before anything
/// is copied. Every buffer allocated along the way is zeroed before it is
/// released, whether decoding succeeds or fails; the returned `String` is
/// the only remaining copy of the plaintext.
pub fn to_unsecure_string(secret: Option<&ProtectedString>) -> Result<String, ConfigError> {
    let secret = secret.ok_or(ConfigError::NullSecret)?;
    let buffer = PlaintextBuffer::copy_from(secret);

    // Validate and size before allocating, so the output never reallocates.
    let mut utf8_len = 0;
    for decoded in char::decode_utf16(buffer.as_slice().iter().copied()) {
        utf8_len += decoded.map_err(|_| ConfigError::SecretDecode)?.len_utf8();
    }

    let mut plaintext = Zeroizing::new(String::with_capacity(utf8_len));
    for decoded in char::decode_utf16(buffer.as_slice().iter().copied()) {
        plaintext.push(decoded.map_err(|_| ConfigError::SecretDecode)?);
    }
    Ok(std::mem::take(&mut *plaintext))
}
