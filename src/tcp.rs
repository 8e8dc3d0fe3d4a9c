//! The TCP chunk-stream codec.
//!
//! One direction of one connection is one context. The stream opens
//! with a cleartext salt of `key_len` bytes; everything after it is a
//! sequence of chunks:
//!
//! ```text
//! [ salt ][ chunk ][ chunk ] ...
//!
//! chunk = [ len ciphertext | 2 + tag ][ payload ciphertext | len + tag ]
//! ```
//!
//! The length header is the 16-bit big-endian payload length,
//! encrypted and authenticated on its own. Each chunk consumes two
//! nonce values, one for the length and one for the payload; the nonce
//! is a little-endian counter starting at zero under the session
//! subkey.

use {
    crate::{
        buf::Buf,
        cipher::Cipher,
        error::{Error, Result},
        kdf,
        primitive::AeadCipher,
        replay::ReplayFilter,
        MAX_PAYLOAD_LEN,
    },
    byteorder::{BigEndian, ByteOrder},
    rand_core::{OsRng, RngCore},
    std::sync::Arc,
    tracing::{debug, warn},
    zeroize::Zeroizing,
};

/// Bytes of the chunk length header before encryption.
const LEN_LEN: usize = 2;

/// Adds one to a little-endian counter.
///
/// Wrapping back around to zero would reuse every nonce in the
/// sequence, so it is a hard error; connections die long before 2^64
/// chunks in practice.
pub(crate) fn increment_le(nonce: &mut [u8]) -> Result<()> {
    for b in nonce.iter_mut() {
        *b = b.wrapping_add(1);
        if *b != 0 {
            return Ok(());
        }
    }
    Err(Error::CounterOverflow)
}

/// Encrypts one direction of a TCP connection.
pub struct Encryptor {
    cipher: Arc<Cipher>,
    aead: AeadCipher,
    salt: Zeroizing<Vec<u8>>,
    nonce: Zeroizing<Vec<u8>>,
    salt_sent: bool,
}

impl Encryptor {
    /// Creates an encrypt context with a fresh random salt.
    ///
    /// The salt and the subkey it selects are fixed for the life of
    /// the context; the salt is emitted in front of the first
    /// ciphertext chunk.
    pub fn new(cipher: Arc<Cipher>) -> Result<Self> {
        let method = cipher.method();
        let mut salt = Zeroizing::new(vec![0u8; method.key_len()]);
        OsRng.try_fill_bytes(&mut salt)?;
        let subkey =
            kdf::derive_session_key(cipher.master_key(), &salt, method.key_len())?;
        Ok(Self {
            aead: AeadCipher::new(method, &subkey)?,
            nonce: Zeroizing::new(vec![0u8; method.nonce_len()]),
            salt,
            salt_sent: false,
            cipher,
        })
    }

    /// Encrypts `plaintext` into framed ciphertext.
    ///
    /// Plaintext longer than [`MAX_PAYLOAD_LEN`] is split across as
    /// many chunks as needed. An empty `plaintext` produces no output
    /// and does not advance any state.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }
        let tag_len = self.cipher.method().tag_len();
        let nchunks = (plaintext.len() + MAX_PAYLOAD_LEN - 1) / MAX_PAYLOAD_LEN;
        let salt_len = if self.salt_sent { 0 } else { self.salt.len() };
        let mut out = Vec::with_capacity(
            salt_len + plaintext.len() + nchunks * (LEN_LEN + 2 * tag_len),
        );
        if !self.salt_sent {
            out.extend_from_slice(&self.salt);
            self.salt_sent = true;
        }
        for payload in plaintext.chunks(MAX_PAYLOAD_LEN) {
            let mut len_be = [0u8; LEN_LEN];
            BigEndian::write_u16(&mut len_be, payload.len() as u16);
            out.extend_from_slice(&self.aead.seal(&self.nonce, &len_be)?);
            increment_le(&mut self.nonce)?;
            out.extend_from_slice(&self.aead.seal(&self.nonce, payload)?);
            increment_le(&mut self.nonce)?;
        }
        Ok(out)
    }
}

/// Decrypts one direction of a TCP connection.
///
/// Feed it ciphertext as it arrives off the wire, in any fragmentation;
/// it buffers internally and emits plaintext whenever one or more whole
/// chunks have been verified.
pub struct Decryptor {
    cipher: Arc<Cipher>,
    aead: Option<AeadCipher>,
    salt: Zeroizing<Vec<u8>>,
    nonce: Zeroizing<Vec<u8>>,
    buf: Buf,
    replay: Option<Arc<ReplayFilter>>,
}

impl Decryptor {
    /// Creates a decrypt context.
    pub fn new(cipher: Arc<Cipher>) -> Self {
        let nonce_len = cipher.method().nonce_len();
        Self {
            aead: None,
            salt: Zeroizing::new(Vec::new()),
            nonce: Zeroizing::new(vec![0u8; nonce_len]),
            buf: Buf::new(),
            replay: None,
            cipher,
        }
    }

    /// Creates a decrypt context that rejects repeated salts.
    ///
    /// Servers pass their process-wide filter here; clients decrypt
    /// without one.
    pub fn with_replay_filter(
        cipher: Arc<Cipher>,
        filter: Arc<ReplayFilter>,
    ) -> Self {
        let mut ctx = Decryptor::new(cipher);
        ctx.replay = Some(filter);
        ctx
    }

    /// Decrypts as much of the stream as `input` completes.
    ///
    /// Returns `Ok(None)` when no whole chunk is available yet; the
    /// bytes are retained and the context stays usable. Returns
    /// `Ok(Some(plaintext))` with every chunk the buffered stream now
    /// covers, concatenated in order. Any `Err` is fatal for the
    /// connection and the context must be dropped.
    pub fn decrypt(&mut self, input: &[u8]) -> Result<Option<Vec<u8>>> {
        self.buf.extend(input);

        if self.aead.is_none() && !self.consume_salt()? {
            return Ok(None);
        }

        let tag_len = self.cipher.method().tag_len();
        let Self {
            aead, nonce, buf, ..
        } = self;
        let aead = match aead {
            Some(aead) => aead,
            None => return Ok(None),
        };

        let mut out = Vec::new();
        loop {
            if buf.len() <= LEN_LEN + 2 * tag_len {
                break;
            }

            // The stored nonce only advances once the whole chunk
            // verifies; a partial chunk re-decrypts its length header
            // with the same nonce on the next call.
            let mut chunk_nonce = nonce.clone();
            let len_pt =
                aead.open(&chunk_nonce, &buf.as_slice()[..LEN_LEN + tag_len])?;
            let mlen = BigEndian::read_u16(&len_pt) as usize;
            if mlen == 0 || mlen > MAX_PAYLOAD_LEN {
                debug!(mlen, "chunk length out of range");
                return Err(Error::Authentication);
            }

            let chunk_len = LEN_LEN + 2 * tag_len + mlen;
            if buf.len() < chunk_len {
                break;
            }

            increment_le(&mut chunk_nonce)?;
            let payload = aead.open(
                &chunk_nonce,
                &buf.as_slice()[LEN_LEN + tag_len..chunk_len],
            )?;
            increment_le(&mut chunk_nonce)?;
            nonce.copy_from_slice(&chunk_nonce);

            out.extend_from_slice(&payload);
            buf.consume(chunk_len);
        }

        if out.is_empty() {
            Ok(None)
        } else {
            Ok(Some(out))
        }
    }

    /// Pulls the salt off the stream head once enough bytes are
    /// buffered, checks it against the replay filter and derives the
    /// session subkey. Returns false until the salt is complete.
    fn consume_salt(&mut self) -> Result<bool> {
        let method = self.cipher.method();
        let key_len = method.key_len();
        if self.buf.len() < key_len {
            return Ok(false);
        }

        self.salt
            .extend_from_slice(&self.buf.as_slice()[..key_len]);
        if let Some(filter) = &self.replay {
            if filter.check(&self.salt)? {
                warn!("repeated salt on inbound stream");
                return Err(Error::Replay);
            }
            filter.add(&self.salt)?;
        }

        let subkey =
            kdf::derive_session_key(self.cipher.master_key(), &self.salt, key_len)?;
        self.aead = Some(AeadCipher::new(method, &subkey)?);
        for b in self.nonce.iter_mut() {
            *b = 0;
        }
        self.buf.consume(key_len);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::method::Method};

    fn pair(method: Method) -> (Encryptor, Decryptor) {
        let cipher = Arc::new(Cipher::new(method, "test").unwrap());
        (
            Encryptor::new(Arc::clone(&cipher)).unwrap(),
            Decryptor::new(cipher),
        )
    }

    fn le_counter(nonce: &[u8]) -> u64 {
        let mut v = 0u64;
        for (i, b) in nonce.iter().enumerate().take(8) {
            v |= (*b as u64) << (8 * i);
        }
        v
    }

    #[test]
    fn test_increment_le() {
        let mut n = [0u8; 4];
        increment_le(&mut n).unwrap();
        assert_eq!(n, [1, 0, 0, 0]);
        let mut n = [0xFF, 0, 0, 0];
        increment_le(&mut n).unwrap();
        assert_eq!(n, [0, 1, 0, 0]);
        let mut n = [0xFF; 4];
        assert!(matches!(
            increment_le(&mut n),
            Err(Error::CounterOverflow)
        ));
    }

    #[test]
    fn test_two_increments_per_chunk() {
        let (mut enc, mut dec) = pair(Method::Aes256Gcm);
        let ct = enc.encrypt(&vec![0x55u8; MAX_PAYLOAD_LEN * 2 + 1]).unwrap();
        assert_eq!(le_counter(&enc.nonce), 6);

        let pt = dec.decrypt(&ct).unwrap().unwrap();
        assert_eq!(pt.len(), MAX_PAYLOAD_LEN * 2 + 1);
        assert_eq!(le_counter(&dec.nonce), 6);
    }

    #[test]
    fn test_empty_encrypt_is_inert() {
        let (mut enc, _) = pair(Method::Aes128Gcm);
        assert!(enc.encrypt(&[]).unwrap().is_empty());
        assert!(!enc.salt_sent);
        assert_eq!(le_counter(&enc.nonce), 0);
    }

    #[test]
    fn test_partial_chunk_keeps_nonce() {
        let (mut enc, mut dec) = pair(Method::ChaCha20IetfPoly1305);
        let ct = enc.encrypt(b"hello").unwrap();

        // Salt, the whole 18-byte length header and most of the
        // 21-byte payload ciphertext: the decoder decrypts the length
        // but must not commit the nonce until the payload verifies.
        let cut = 32 + 18 + 17;
        assert!(dec.decrypt(&ct[..cut]).unwrap().is_none());
        assert_eq!(le_counter(&dec.nonce), 0);

        let pt = dec.decrypt(&ct[cut..]).unwrap().unwrap();
        assert_eq!(pt, b"hello");
        assert_eq!(le_counter(&dec.nonce), 2);
    }

    #[test]
    fn test_salt_alone_arms_but_emits_nothing() {
        let (mut enc, mut dec) = pair(Method::Aes256Gcm);
        let ct = enc.encrypt(b"x").unwrap();
        assert!(dec.decrypt(&ct[..32]).unwrap().is_none());
        assert!(dec.aead.is_some());
        let pt = dec.decrypt(&ct[32..]).unwrap().unwrap();
        assert_eq!(pt, b"x");
    }
}
