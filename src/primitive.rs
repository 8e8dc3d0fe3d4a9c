//! A uniform seal/open interface over the six supported AEAD methods.
//!
//! Associated data is never used by the framing layer, so the adapter
//! does not expose it. Inputs and outputs never alias; `seal` returns
//! `ciphertext || tag` and `open` verifies the tag before any plaintext
//! is produced.

use {
    crate::{
        error::{Error, Result},
        method::Method,
    },
    aead::{Aead, KeyInit, Nonce},
    aes::Aes192,
    aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm},
    chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305},
    typenum::U12,
};

/// AES-192-GCM has no upstream alias.
type Aes192Gcm = AesGcm<Aes192, U12>;

/// One cipher instance keyed for a single connection direction (TCP)
/// or a single datagram role (UDP).
pub struct AeadCipher(Inner);

enum Inner {
    Aes128Gcm(Aes128Gcm),
    Aes192Gcm(Aes192Gcm),
    Aes256Gcm(Aes256Gcm),
    ChaCha20Poly1305(legacy::ChaCha20Poly1305Legacy),
    ChaCha20IetfPoly1305(ChaCha20Poly1305),
    XChaCha20IetfPoly1305(XChaCha20Poly1305),
}

impl AeadCipher {
    /// Creates a cipher instance for `method` keyed with `key`.
    ///
    /// `key` must be exactly `method.key_len()` bytes.
    pub fn new(method: Method, key: &[u8]) -> Result<Self> {
        Ok(AeadCipher(match method {
            Method::Aes128Gcm => {
                Inner::Aes128Gcm(Aes128Gcm::new_from_slice(key)?)
            }
            Method::Aes192Gcm => {
                Inner::Aes192Gcm(Aes192Gcm::new_from_slice(key)?)
            }
            Method::Aes256Gcm => {
                Inner::Aes256Gcm(Aes256Gcm::new_from_slice(key)?)
            }
            Method::ChaCha20Poly1305 => Inner::ChaCha20Poly1305(
                legacy::ChaCha20Poly1305Legacy::new(key)?,
            ),
            Method::ChaCha20IetfPoly1305 => Inner::ChaCha20IetfPoly1305(
                ChaCha20Poly1305::new_from_slice(key)?,
            ),
            Method::XChaCha20IetfPoly1305 => Inner::XChaCha20IetfPoly1305(
                XChaCha20Poly1305::new_from_slice(key)?,
            ),
        }))
    }

    /// Encrypts `plaintext`, returning `ciphertext || tag`.
    ///
    /// `nonce` must be exactly `method.nonce_len()` bytes.
    pub fn seal(&self, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        match &self.0 {
            Inner::Aes128Gcm(c) => {
                c.encrypt(Nonce::<Aes128Gcm>::from_slice(nonce), plaintext)
            }
            Inner::Aes192Gcm(c) => {
                c.encrypt(Nonce::<Aes192Gcm>::from_slice(nonce), plaintext)
            }
            Inner::Aes256Gcm(c) => {
                c.encrypt(Nonce::<Aes256Gcm>::from_slice(nonce), plaintext)
            }
            Inner::ChaCha20Poly1305(c) => return c.seal(nonce, plaintext),
            Inner::ChaCha20IetfPoly1305(c) => {
                c.encrypt(Nonce::<ChaCha20Poly1305>::from_slice(nonce), plaintext)
            }
            Inner::XChaCha20IetfPoly1305(c) => {
                c.encrypt(Nonce::<XChaCha20Poly1305>::from_slice(nonce), plaintext)
            }
        }
        .map_err(Error::Encryption)
    }

    /// Verifies and decrypts `ciphertext || tag`, returning the
    /// plaintext.
    ///
    /// Any mismatch, including a truncated input, is
    /// [`Error::Authentication`]; nothing is emitted in that case.
    pub fn open(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        match &self.0 {
            Inner::Aes128Gcm(c) => {
                c.decrypt(Nonce::<Aes128Gcm>::from_slice(nonce), ciphertext)
            }
            Inner::Aes192Gcm(c) => {
                c.decrypt(Nonce::<Aes192Gcm>::from_slice(nonce), ciphertext)
            }
            Inner::Aes256Gcm(c) => {
                c.decrypt(Nonce::<Aes256Gcm>::from_slice(nonce), ciphertext)
            }
            Inner::ChaCha20Poly1305(c) => return c.open(nonce, ciphertext),
            Inner::ChaCha20IetfPoly1305(c) => c.decrypt(
                Nonce::<ChaCha20Poly1305>::from_slice(nonce),
                ciphertext,
            ),
            Inner::XChaCha20IetfPoly1305(c) => c.decrypt(
                Nonce::<XChaCha20Poly1305>::from_slice(nonce),
                ciphertext,
            ),
        }
        .map_err(|_| Error::Authentication)
    }
}

mod legacy {
    //! The original ChaCha20-Poly1305 construction (draft-agl), which
    //! predates RFC 8439: an 8-byte nonce, a Poly1305 key taken from
    //! the first 32 keystream bytes of block zero, and an unpadded MAC
    //! input of `aad || le64(aad_len) || ct || le64(ct_len)`.
    //!
    //! No registry crate ships this variant as an AEAD, so it is
    //! composed here from the stream cipher and the one-time
    //! authenticator.

    use {
        crate::error::{Error, Result},
        aead::KeyInit,
        chacha20::{
            cipher::{KeyIvInit, StreamCipher, StreamCipherSeek},
            ChaCha20Legacy, Key, LegacyNonce,
        },
        poly1305::Poly1305,
        subtle::ConstantTimeEq,
        zeroize::{Zeroize, Zeroizing},
    };

    const KEY_LEN: usize = 32;
    const TAG_LEN: usize = 16;

    pub(super) struct ChaCha20Poly1305Legacy {
        key: [u8; KEY_LEN],
    }

    impl ChaCha20Poly1305Legacy {
        pub(super) fn new(key: &[u8]) -> Result<Self> {
            let key: [u8; KEY_LEN] = key
                .try_into()
                .map_err(|_| Error::KeyLength(key.len()))?;
            Ok(Self { key })
        }

        /// Returns the keystream positioned at block 1 and the
        /// Poly1305 key drawn from block 0.
        fn start(&self, nonce: &[u8]) -> (ChaCha20Legacy, Zeroizing<[u8; 32]>) {
            let mut cipher = ChaCha20Legacy::new(
                Key::from_slice(&self.key),
                LegacyNonce::from_slice(nonce),
            );
            let mut mac_key = Zeroizing::new([0u8; 32]);
            cipher.apply_keystream(&mut mac_key[..]);
            cipher.seek(64usize);
            (cipher, mac_key)
        }

        fn tag(mac_key: &[u8; 32], ciphertext: &[u8]) -> poly1305::Tag {
            let mut msg = Vec::with_capacity(16 + ciphertext.len());
            msg.extend_from_slice(&0u64.to_le_bytes());
            msg.extend_from_slice(ciphertext);
            msg.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
            Poly1305::new(poly1305::Key::from_slice(mac_key)).compute_unpadded(&msg)
        }

        pub(super) fn seal(&self, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
            let (mut cipher, mac_key) = self.start(nonce);
            let mut out = Vec::with_capacity(plaintext.len() + TAG_LEN);
            out.extend_from_slice(plaintext);
            cipher.apply_keystream(&mut out);
            let tag = Self::tag(&mac_key, &out);
            out.extend_from_slice(tag.as_slice());
            Ok(out)
        }

        pub(super) fn open(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
            if ciphertext.len() < TAG_LEN {
                return Err(Error::Authentication);
            }
            let (ct, tag) = ciphertext.split_at(ciphertext.len() - TAG_LEN);
            let (mut cipher, mac_key) = self.start(nonce);
            let expected = Self::tag(&mac_key, ct);
            if !bool::from(expected.as_slice().ct_eq(tag)) {
                return Err(Error::Authentication);
            }
            let mut out = Vec::with_capacity(ct.len());
            out.extend_from_slice(ct);
            cipher.apply_keystream(&mut out);
            Ok(out)
        }
    }

    impl Drop for ChaCha20Poly1305Legacy {
        fn drop(&mut self) {
            self.key.zeroize();
        }
    }
}
