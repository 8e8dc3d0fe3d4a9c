//! **shroud** implements the AEAD framing layer of an obfuscating
//! transport proxy: it turns a byte stream or a datagram flow into
//! authenticated ciphertext under a pre-shared password, and turns it
//! back, incrementally, on the other side.
//!
//! A connection picks one of six AEAD methods ([`Method`]). The
//! password is hashed into a master key ([`Cipher`]); each TCP
//! direction then derives its own subkey from a random salt sent in
//! the clear at the head of the stream, and encrypts the stream as a
//! sequence of chunks with a counting nonce:
//!
//! ```text
//! [ salt | key_len ][ chunk ][ chunk ] ...
//!
//! chunk = [ length ct | 2 + tag ][ payload ct | length + tag ]
//! ```
//!
//! The length header is a 16-bit big-endian payload length, at most
//! [`MAX_PAYLOAD_LEN`], sealed and verified separately from the
//! payload so a receiver can frame the stream without trusting any
//! cleartext. Each chunk spends two nonce values. UDP skips the
//! session layer entirely: every datagram is sealed under the master
//! key with a fresh salt ([`udp`]).
//!
//! Receiving servers feed every observed salt through a shared
//! [`ReplayFilter`]; a replayed stream or datagram is rejected before
//! any plaintext is produced.
//!
//! The codec is synchronous and never blocks: [`Encryptor::encrypt`]
//! returns complete frames, [`Decryptor::decrypt`] buffers arbitrary
//! fragmentation and emits whatever it can verify. All socket I/O,
//! connection state and password handling belong to the caller.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod buf;
mod cipher;
mod error;
mod kdf;
mod method;
mod primitive;
mod replay;
mod tcp;
pub mod udp;

pub use cipher::*;
pub use error::*;
pub use kdf::*;
pub use method::*;
pub use primitive::*;
pub use replay::*;
pub use tcp::*;

/// Longest plaintext payload a single TCP chunk may carry.
///
/// The two high bits of the length header are reserved and must be
/// zero on the wire.
pub const MAX_PAYLOAD_LEN: usize = 0x3FFF;
