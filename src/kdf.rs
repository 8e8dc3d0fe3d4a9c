//! Key derivation.
//!
//! The master key is an unkeyed BLAKE2b hash of the user password with
//! the output length equal to the method's key length. It only has to
//! avoid collisions between passwords; it is not a password hash
//! suitable for storage.
//!
//! Session subkeys are a keyed BLAKE2b MAC: the master key is the MAC
//! key, the first 16 bytes of the session salt fill BLAKE2b's salt
//! parameter, and a fixed personalization string ties the derivation to
//! this deployment. The message is empty.

use {
    crate::error::{Error, Result},
    blake2::{
        digest::{
            consts::{U16, U24, U32},
            InvalidLength, Mac, Update, VariableOutput,
        },
        Blake2bMac, Blake2bVar,
    },
    zeroize::Zeroizing,
};

/// Personalization string for session-subkey derivation.
///
/// These 16 bytes are part of the wire format: both peers must use the
/// identical constant or no chunk will ever authenticate. Frozen; do
/// not edit.
pub const SUBKEY_PERSONA: &[u8; 16] = b"fuckshadows-g3nk";

/// How many salt bytes feed the BLAKE2b salt parameter.
///
/// BLAKE2b's salt parameter is exactly 16 bytes, so longer session
/// salts are truncated here (the full salt still diversifies nothing
/// beyond these bytes).
const SALT_FEED: usize = 16;

/// Derives the master key from a password.
///
/// Deterministic: identical inputs yield identical outputs.
pub fn derive_master_key(
    password: &[u8],
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut hasher =
        Blake2bVar::new(key_len).map_err(|_| Error::InvalidKeySize(InvalidLength))?;
    hasher.update(password);
    let mut key = Zeroizing::new(vec![0u8; key_len]);
    hasher
        .finalize_variable(&mut key)
        .map_err(|_| Error::InvalidKeySize(InvalidLength))?;
    Ok(key)
}

/// Derives the per-session subkey from the master key and the session
/// salt carried on the wire.
pub fn derive_session_key(
    master: &[u8],
    salt: &[u8],
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let salt = &salt[..SALT_FEED.min(salt.len())];
    let key = match key_len {
        16 => Blake2bMac::<U16>::new_with_salt_and_personal(master, salt, SUBKEY_PERSONA)?
            .finalize()
            .into_bytes()
            .to_vec(),
        24 => Blake2bMac::<U24>::new_with_salt_and_personal(master, salt, SUBKEY_PERSONA)?
            .finalize()
            .into_bytes()
            .to_vec(),
        32 => Blake2bMac::<U32>::new_with_salt_and_personal(master, salt, SUBKEY_PERSONA)?
            .finalize()
            .into_bytes()
            .to_vec(),
        _ => return Err(Error::InvalidKeySize(InvalidLength)),
    };
    Ok(Zeroizing::new(key))
}
