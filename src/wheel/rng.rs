//! Minimal-standard (Park-Miller) linear congruential generator
//!
//! Same seed, same sequence. Backups carry the seed, so a restored vault
//! lands its next spin exactly where the exporting vault would have.

use serde::{Deserialize, Serialize};

/// Modulus 2^31 - 1
pub const LCG_MODULUS: i64 = 2_147_483_647;
/// Multiplier 7^5
pub const LCG_MULTIPLIER: i64 = 16_807;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lcg {
    value: i64,
}

impl Lcg {
    pub fn new(seed: i64) -> Self {
        let mut value = seed % LCG_MODULUS;
        if value <= 0 {
            value += LCG_MODULUS - 1;
        }
        // State 0 is a fixed point of the recurrence and would draw -1/(M-1)
        if value == 0 {
            value = LCG_MODULUS - 1;
        }
        Self { value }
    }

    /// Next draw in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.value = (self.value * LCG_MULTIPLIER) % LCG_MODULUS;
        (self.value - 1) as f64 / (LCG_MODULUS - 1) as f64
    }

    /// One raw step of the recurrence, used to move the stored seed on
    /// after every completed spin
    pub fn advance_seed(seed: i64) -> i64 {
        (seed % LCG_MODULUS) * LCG_MULTIPLIER % LCG_MODULUS
    }
}
