// PCG-LCG random stream with skip-ahead, so each history owns a
// reproducible, non-overlapping block of the sequence.

use rand::{RngCore, SeedableRng};

const PRN_MULT: u64 = 6364136223846793005;
const PRN_ADD: u64 = 1442695040888963407;

/// Draws reserved for each history before the next history's block starts.
pub const HISTORY_STRIDE: u64 = 152917;

/// Linear congruential state with an RXS-M-XS output permutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FastRng {
    state: u64,
}

impl FastRng {
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Stream for history `index` of a run seeded with `seed`.
    ///
    /// Histories are independent of the order in which they are run, which is
    /// what makes a paused and resumed run identical to an uninterrupted one.
    pub fn for_history(seed: u64, index: u64) -> Self {
        Self::new(skip_ahead(seed, index.wrapping_mul(HISTORY_STRIDE)))
    }

    /// Uniform draw in [0, 1).
    #[inline(always)]
    pub fn uniform(&mut self) -> f64 {
        // top 53 bits, so the result never rounds up to 1.0
        (self.next_u64() >> 11) as f64 * 1.1102230246251565e-16
    }

    /// Jumps `n` draws forward without generating them.
    pub fn advance(&mut self, n: u64) {
        self.state = skip_ahead(self.state, n);
    }

    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.state = seed;
    }
}

/// State reached after `n` LCG steps from `state`, in O(log n).
fn skip_ahead(state: u64, mut n: u64) -> u64 {
    let mut g = PRN_MULT;
    let mut c = PRN_ADD;
    let mut g_new: u64 = 1;
    let mut c_new: u64 = 0;
    while n > 0 {
        if n & 1 == 1 {
            g_new = g_new.wrapping_mul(g);
            c_new = c_new.wrapping_mul(g).wrapping_add(c);
        }
        c = g.wrapping_add(1).wrapping_mul(c);
        g = g.wrapping_mul(g);
        n >>= 1;
    }
    g_new.wrapping_mul(state).wrapping_add(c_new)
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.state = PRN_MULT.wrapping_mul(self.state).wrapping_add(PRN_ADD);
        let word = ((self.state >> ((self.state >> 59) + 5)) ^ self.state)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
