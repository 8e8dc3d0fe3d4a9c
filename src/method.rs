use {
    crate::error::Error,
    std::{fmt, str},
};

/// Denotes the supported AEAD methods.
///
/// The numeric ids and parameter table are part of the wire protocol
/// and must not change:
///
/// | id | name                     | key | nonce | tag |
/// |----|--------------------------|-----|-------|-----|
/// | 0  | aes-128-gcm              | 16  | 12    | 16  |
/// | 1  | aes-192-gcm              | 24  | 12    | 16  |
/// | 2  | aes-256-gcm              | 32  | 12    | 16  |
/// | 3  | chacha20-poly1305        | 32  | 8     | 16  |
/// | 4  | chacha20-ietf-poly1305   | 32  | 12    | 16  |
/// | 5  | xchacha20-ietf-poly1305  | 32  | 24    | 16  |
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Method {
    /// AES-128 in Galois/Counter Mode.
    Aes128Gcm,
    /// AES-192 in Galois/Counter Mode.
    Aes192Gcm,
    /// AES-256 in Galois/Counter Mode.
    Aes256Gcm,
    /// The original ChaCha20-Poly1305 construction with an 8-byte
    /// nonce.
    ChaCha20Poly1305,
    /// ChaCha20-Poly1305 as standardized in RFC 8439 (12-byte nonce).
    ChaCha20IetfPoly1305,
    /// XChaCha20-Poly1305 with an extended 24-byte nonce.
    XChaCha20IetfPoly1305,
}

impl Method {
    /// All supported methods, in id order.
    pub const ALL: [Method; 6] = [
        Method::Aes128Gcm,
        Method::Aes192Gcm,
        Method::Aes256Gcm,
        Method::ChaCha20Poly1305,
        Method::ChaCha20IetfPoly1305,
        Method::XChaCha20IetfPoly1305,
    ];

    /// Returns the method's stable numeric id.
    pub const fn id(self) -> u8 {
        match self {
            Method::Aes128Gcm => 0,
            Method::Aes192Gcm => 1,
            Method::Aes256Gcm => 2,
            Method::ChaCha20Poly1305 => 3,
            Method::ChaCha20IetfPoly1305 => 4,
            Method::XChaCha20IetfPoly1305 => 5,
        }
    }

    /// Returns the method's wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Method::Aes128Gcm => "aes-128-gcm",
            Method::Aes192Gcm => "aes-192-gcm",
            Method::Aes256Gcm => "aes-256-gcm",
            Method::ChaCha20Poly1305 => "chacha20-poly1305",
            Method::ChaCha20IetfPoly1305 => "chacha20-ietf-poly1305",
            Method::XChaCha20IetfPoly1305 => "xchacha20-ietf-poly1305",
        }
    }

    /// Returns the key length in bytes.
    ///
    /// The per-connection salt has this same length.
    pub const fn key_len(self) -> usize {
        match self {
            Method::Aes128Gcm => 16,
            Method::Aes192Gcm => 24,
            _ => 32,
        }
    }

    /// Returns the nonce length in bytes.
    pub const fn nonce_len(self) -> usize {
        match self {
            Method::ChaCha20Poly1305 => 8,
            Method::XChaCha20IetfPoly1305 => 24,
            _ => 12,
        }
    }

    /// Returns the authentication tag length in bytes.
    pub const fn tag_len(self) -> usize {
        16
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Method, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::UnknownMethod(s.into()))
    }
}
