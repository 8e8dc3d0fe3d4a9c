use {
    crate::{error::Result, kdf, method::Method},
    std::fmt,
    zeroize::Zeroizing,
};

/// Per-connection cipher descriptor: the chosen method and the master
/// key derived from the pre-shared password.
///
/// Immutable after construction and freely shareable (typically behind
/// an [`std::sync::Arc`]) between the encrypt and decrypt halves of a
/// connection and across the TCP and UDP paths. The master key is
/// wiped when the descriptor is dropped.
pub struct Cipher {
    method: Method,
    master_key: Zeroizing<Vec<u8>>,
}

impl Cipher {
    /// Creates a descriptor for `method`, deriving the master key from
    /// `password`.
    pub fn new(method: Method, password: &str) -> Result<Self> {
        let master_key =
            kdf::derive_master_key(password.as_bytes(), method.key_len())?;
        Ok(Self { method, master_key })
    }

    /// Creates a descriptor from a wire method name such as
    /// `"aes-256-gcm"`.
    pub fn from_name(name: &str, password: &str) -> Result<Self> {
        Cipher::new(name.parse()?, password)
    }

    /// Returns the method this descriptor was built for.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the master key.
    ///
    /// `method().key_len()` bytes. Exposed for transport layers that
    /// feed the key into out-of-band authentication; handle with care.
    pub fn master_key(&self) -> &[u8] {
        &self.master_key
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("method", &self.method)
            .field("master_key", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_length_tracks_method() {
        for method in Method::ALL {
            let cipher = Cipher::new(method, "test").unwrap();
            assert_eq!(cipher.master_key().len(), method.key_len());
        }
    }

    #[test]
    fn test_from_name() {
        let cipher = Cipher::from_name("chacha20-ietf-poly1305", "pw").unwrap();
        assert_eq!(cipher.method(), Method::ChaCha20IetfPoly1305);
        assert!(Cipher::from_name("rot13", "pw").is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let cipher = Cipher::new(Method::Aes128Gcm, "hunter2").unwrap();
        let s = format!("{:?}", cipher);
        assert!(s.contains("redacted"));
    }
}
