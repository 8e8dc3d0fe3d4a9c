//! Replay suppression over observed salts.
//!
//! Servers remember every salt they have accepted and refuse a
//! connection or datagram whose salt has been seen before, defeating
//! replayed captures. Membership is tracked by a scalable Bloom
//! filter: a chain of fixed-size slices, each sized for a target
//! false-positive rate. When the newest slice fills up, another is
//! appended with doubled capacity and a halved error target, so the
//! compound error rate stays bounded while the filter grows with
//! traffic. False positives spuriously reject a fresh connection
//! (rare, and clients simply retry with a new salt); false negatives
//! never occur.

use {
    crate::error::{Error, Result},
    byteorder::{ByteOrder, LittleEndian},
    sha2::{Digest, Sha256},
    std::sync::Mutex,
};

/// Default expected salt count, matching a long-lived server's worth
/// of connections between restarts.
const DEFAULT_CAPACITY: usize = 1_000_000;

/// Default per-slice false-positive target.
const DEFAULT_ERROR_RATE: f64 = 1e-6;

/// Capacity multiplier for each appended slice.
const GROWTH: usize = 2;

/// Error-rate multiplier for each appended slice.
const TIGHTENING: f64 = 0.5;

const LN_2: f64 = std::f64::consts::LN_2;

/// Two independent 64-bit hashes of a salt, combined per
/// Kirsch-Mitzenmacher to drive every probe position.
fn hash(salt: &[u8]) -> (u64, u64) {
    let digest = Sha256::digest(salt);
    let h1 = LittleEndian::read_u64(&digest[..8]);
    // A zero stride would collapse every probe onto one position.
    let h2 = LittleEndian::read_u64(&digest[8..16]) | 1;
    (h1, h2)
}

struct Slice {
    bits: Vec<u64>,
    num_bits: u64,
    hashers: u32,
    items: usize,
    capacity: usize,
    error_rate: f64,
}

impl Slice {
    fn new(capacity: usize, error_rate: f64) -> Self {
        let n = capacity.max(1) as f64;
        let num_bits = (-(n * error_rate.ln()) / (LN_2 * LN_2)).ceil() as u64;
        let num_bits = num_bits.max(64);
        let hashers = ((num_bits as f64 / n) * LN_2).round().max(1.0) as u32;
        Slice {
            bits: vec![0u64; ((num_bits + 63) / 64) as usize],
            num_bits,
            hashers,
            items: 0,
            capacity: capacity.max(1),
            error_rate,
        }
    }

    fn position(&self, h1: u64, h2: u64, i: u32) -> (usize, u64) {
        let bit = h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits;
        ((bit / 64) as usize, 1u64 << (bit % 64))
    }

    fn contains(&self, h1: u64, h2: u64) -> bool {
        (0..self.hashers).all(|i| {
            let (word, mask) = self.position(h1, h2, i);
            self.bits[word] & mask != 0
        })
    }

    fn insert(&mut self, h1: u64, h2: u64) {
        for i in 0..self.hashers {
            let (word, mask) = self.position(h1, h2, i);
            self.bits[word] |= mask;
        }
        self.items += 1;
    }

    fn is_full(&self) -> bool {
        self.items >= self.capacity
    }
}

/// A thread-safe scalable Bloom filter over salts.
///
/// Shared across every inbound context of a server process; `check`
/// and `add` may be called concurrently from any thread.
pub struct ReplayFilter {
    slices: Mutex<Vec<Slice>>,
}

impl ReplayFilter {
    /// Creates a filter with the deployment default sizing.
    pub fn new() -> Self {
        Self::with_params(DEFAULT_CAPACITY, DEFAULT_ERROR_RATE)
    }

    /// Creates a filter sized for `capacity` expected salts at
    /// `error_rate` false positives in the first slice.
    pub fn with_params(capacity: usize, error_rate: f64) -> Self {
        ReplayFilter {
            slices: Mutex::new(vec![Slice::new(capacity, error_rate)]),
        }
    }

    /// Reports whether `salt` may have been observed before.
    pub fn check(&self, salt: &[u8]) -> Result<bool> {
        let (h1, h2) = hash(salt);
        let slices = self.slices.lock().map_err(|_| Error::FilterPoisoned)?;
        Ok(slices.iter().any(|s| s.contains(h1, h2)))
    }

    /// Records `salt` as observed.
    pub fn add(&self, salt: &[u8]) -> Result<()> {
        let (h1, h2) = hash(salt);
        let mut slices = self.slices.lock().map_err(|_| Error::FilterPoisoned)?;
        if slices.last().map_or(true, Slice::is_full) {
            let (capacity, error_rate) = slices
                .last()
                .map(|s| (s.capacity * GROWTH, s.error_rate * TIGHTENING))
                .unwrap_or((DEFAULT_CAPACITY, DEFAULT_ERROR_RATE));
            slices.push(Slice::new(capacity, error_rate));
        }
        if let Some(active) = slices.last_mut() {
            active.insert(h1, h2);
        }
        Ok(())
    }
}

impl Default for ReplayFilter {
    fn default() -> Self {
        ReplayFilter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt(i: u32) -> [u8; 32] {
        let mut s = [0u8; 32];
        s[..4].copy_from_slice(&i.to_le_bytes());
        s
    }

    #[test]
    fn test_absent_then_present() {
        let filter = ReplayFilter::with_params(128, 0.001);
        assert!(!filter.check(&salt(1)).unwrap());
        filter.add(&salt(1)).unwrap();
        assert!(filter.check(&salt(1)).unwrap());
    }

    #[test]
    fn test_no_false_negatives_across_growth() {
        // Overfill a tiny first slice so several generations get
        // appended; everything inserted must still be found.
        let filter = ReplayFilter::with_params(16, 0.01);
        for i in 0..1000 {
            filter.add(&salt(i)).unwrap();
        }
        for i in 0..1000 {
            assert!(filter.check(&salt(i)).unwrap(), "lost salt {}", i);
        }
        assert!(filter.slices.lock().unwrap().len() > 1);
    }

    #[test]
    fn test_false_positive_rate_is_sane() {
        let filter = ReplayFilter::with_params(1000, 0.001);
        for i in 0..1000 {
            filter.add(&salt(i)).unwrap();
        }
        let hits = (1000..11_000)
            .filter(|&i| filter.check(&salt(i)).unwrap())
            .count();
        // 0.1% of 10k lookups is ~10; two orders of headroom.
        assert!(hits < 200, "false positive rate too high: {}/10000", hits);
    }

    #[test]
    fn test_shared_across_threads() {
        let filter = std::sync::Arc::new(ReplayFilter::with_params(4096, 0.001));
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let filter = std::sync::Arc::clone(&filter);
                std::thread::spawn(move || {
                    for i in 0..256 {
                        filter.add(&salt(t * 1000 + i)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for t in 0..4u32 {
            for i in 0..256 {
                assert!(filter.check(&salt(t * 1000 + i)).unwrap());
            }
        }
    }
}
