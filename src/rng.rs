//! A tiny, seedable random number generator whose output is easy to reproduce in other
//! environments, so that a shared seed gives the same scatter everywhere.

use rand::{Error, RngCore, SeedableRng};
use rand_core::impls;

/// The Mulberry32 generator: 32 bits of state, advanced by a Weyl sequence and mixed with
/// xorshift-multiply steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: [u8; 4]) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Draws a float from `0.0..1.0` as `next_u32() / 2^32`, matching how the reference generator
/// turns its output into a unit float
pub fn next_unit<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    rng.next_u32() as f64 / 4_294_967_296.0
}
