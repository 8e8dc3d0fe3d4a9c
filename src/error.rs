use {
    blake2::digest::InvalidLength,
    std::{error, fmt, result},
};

/// Result is a specialized [`result::Result`] for this crate.
pub type Result<T> = result::Result<T, Error>;

/// Error is the error type returned by this crate.
///
/// Every variant except the construction-time ones
/// ([`Error::UnknownMethod`], [`Error::InvalidKeySize`],
/// [`Error::KeyLength`]) is fatal for the connection or datagram it
/// occurred on: the codec never retries, and a context that returned
/// an error must be dropped.
#[derive(Debug)]
pub enum Error {
    /// The cipher name does not match any supported method.
    UnknownMethod(String),
    /// A key did not have the method's length.
    ///
    /// It contains the length in bytes of the rejected key.
    KeyLength(usize),
    /// The ciphertext could not be authenticated, or the decrypted
    /// chunk length was zero or above the chunk ceiling.
    ///
    /// No plaintext has been emitted.
    Authentication,
    /// The salt was already observed inside the replay filter's
    /// retention window.
    Replay,
    /// The datagram is too short to hold a salt and a tag.
    TooShort,
    /// The nonce counter wrapped around to zero.
    CounterOverflow,
    /// A key or derived subkey had a size the primitive rejects.
    InvalidKeySize(InvalidLength),
    /// The plaintext could not be encrypted.
    Encryption(aead::Error),
    /// The CSPRNG failed.
    Rand(rand_core::Error),
    /// The replay filter's lock was poisoned by a panicked thread.
    FilterPoisoned,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownMethod(name) => {
                write!(f, "unknown cipher method: {}", name)
            }
            Error::KeyLength(n) => {
                write!(f, "wrong key length: {} bytes", n)
            }
            Error::Authentication => write!(f, "authentication error"),
            Error::Replay => write!(f, "repeated salt detected"),
            Error::TooShort => write!(f, "datagram below minimum envelope"),
            Error::CounterOverflow => write!(f, "nonce counter overflow"),
            Error::InvalidKeySize(err) => {
                write!(f, "invalid key size: {}", err)
            }
            Error::Encryption(err) => write!(f, "encryption error: {}", err),
            Error::Rand(err) => write!(f, "CSPRNG failure: {}", err),
            Error::FilterPoisoned => write!(f, "replay filter poisoned"),
        }
    }
}

impl error::Error for Error {}

impl From<InvalidLength> for Error {
    fn from(value: InvalidLength) -> Self {
        Error::InvalidKeySize(value)
    }
}

impl From<aead::Error> for Error {
    fn from(value: aead::Error) -> Self {
        Error::Encryption(value)
    }
}

impl From<rand_core::Error> for Error {
    fn from(value: rand_core::Error) -> Self {
        Error::Rand(value)
    }
}
