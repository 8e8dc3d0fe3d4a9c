use zeroize::Zeroize;

/// A growable buffer consumed from the front.
///
/// Holds ciphertext between incremental decrypt calls: input bytes are
/// appended at the back, whole salts and chunks are consumed from the
/// front. Consumption compacts immediately, so the buffer never holds
/// more than a bounded overhang beyond one maximum chunk. Storage is
/// zeroed on drop.
#[derive(Default)]
pub(crate) struct Buf {
    data: Vec<u8>,
}

impl Buf {
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Returns the number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Appends `bytes` at the back.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Returns the unconsumed bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Removes the first `n` bytes.
    pub fn consume(&mut self, n: usize) {
        let len = self.data.len();
        debug_assert!(n <= len);
        let n = n.min(len);
        self.data.copy_within(n.., 0);
        self.data.truncate(len - n);
    }
}

impl Drop for Buf {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_consume() {
        let mut b = Buf::new();
        assert_eq!(b.len(), 0);
        b.extend(b"hello, ");
        b.extend(b"world!");
        assert_eq!(b.as_slice(), b"hello, world!");
        b.consume(7);
        assert_eq!(b.as_slice(), b"world!");
        b.consume(0);
        assert_eq!(b.len(), 6);
        b.consume(6);
        assert_eq!(b.len(), 0);
    }

    #[test]
    fn test_interleaved() {
        let mut b = Buf::new();
        for i in 0u8..100 {
            b.extend(&[i; 3]);
            b.consume(2);
        }
        assert_eq!(b.len(), 100);
        assert_eq!(b.as_slice()[99], 99);
    }
}
