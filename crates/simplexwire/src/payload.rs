use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_MAX_LEN: usize = 1 << 18;

/// Deterministic payload stream: both ends built with the same seed and
/// `max_len` yield the same sequence.
///
/// Each payload is 1..=`max_len` bytes of pseudo-random data.
pub struct SeededPayloads {
    rng: StdRng,
    max_len: usize,
}

impl SeededPayloads {
    pub fn new(seed: u64, max_len: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_len: max_len.max(1),
        }
    }
}

impl Iterator for SeededPayloads {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let len = self.rng.random_range(1..=self.max_len);
        let mut payload = vec![0u8; len];
        self.rng.fill(&mut payload[..]);
        Some(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let a: Vec<_> = SeededPayloads::new(413, 4096).take(20).collect();
        let b: Vec<_> = SeededPayloads::new(413, 4096).take(20).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_differs() {
        let a: Vec<_> = SeededPayloads::new(1, 4096).take(5).collect();
        let b: Vec<_> = SeededPayloads::new(2, 4096).take(5).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn lengths_stay_in_range() {
        for payload in SeededPayloads::new(9, 64).take(500) {
            assert!((1..=64).contains(&payload.len()));
        }
    }

    #[test]
    fn zero_max_len_yields_single_bytes() {
        for payload in SeededPayloads::new(9, 0).take(10) {
            assert_eq!(payload.len(), 1);
        }
    }
}
