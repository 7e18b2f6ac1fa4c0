//! Deterministic random source for simulated message delivery.
//!
//! The loopback network uses this to decide which sender's queue delivers
//! next. A fixed seed reproduces the exact interleaving, so a race found by
//! a test can be replayed.
//!
//! ```
//! use draughts_sync::core::DeliveryRng;
//!
//! let mut a = DeliveryRng::new(7);
//! let mut b = DeliveryRng::new(7);
//! assert_eq!(a.pick(10), b.pick(10));
//! assert_eq!(a.pick(0), None);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded ChaCha8 stream.
#[derive(Clone, Debug)]
pub struct DeliveryRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl DeliveryRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Derive an independent, deterministic stream.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }

    /// Pick an index in `0..len`, or `None` when `len` is zero.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }

    /// Generate a random boolean with given probability of true.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability)
    }

}
