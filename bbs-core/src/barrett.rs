//! Barrett reduction: division-free `v mod m` from a precomputed reciprocal.
//!
//! For an L-bit modulus m the reducer stores mu = floor(2^(2L)/m) + 1. For any
//! v < m^2 the quotient estimate q = (mu*v) >> 2L is the true quotient or one
//! too high, so v - q*m lands in (-m, m) and a single conditional correction
//! restores the canonical residue. Every hot path in this crate, from the
//! squaring step to the seek exponentiation, reduces through this type.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

/// Precomputed reciprocal for a fixed modulus.
#[derive(Debug, Clone)]
pub struct BarrettReducer {
    modulus: BigUint,
    mu: BigUint,
    shift: u64,
}

impl BarrettReducer {
    /// Build a reducer for `modulus > 1`.
    pub fn new(modulus: &BigUint) -> Self {
        assert!(modulus > &BigUint::one(), "modulus must exceed 1");
        let shift = 2 * modulus.bits();
        let mu = (BigUint::one() << shift) / modulus + 1u32;
        Self {
            modulus: modulus.clone(),
            mu,
            shift,
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Reduce v < m^2 to v mod m.
    pub fn reduce(&self, v: &BigUint) -> BigUint {
        debug_assert!(v.bits() <= self.shift, "operand exceeds the 2L window");
        let q = (&self.mu * v) >> self.shift;
        let qm = q * &self.modulus;
        // q overestimates by at most one, never underestimates
        let mut r = if qm > *v {
            v + &self.modulus - qm
        } else {
            v - qm
        };
        if r >= self.modulus {
            r -= &self.modulus;
        }
        r
    }

    /// (a * b) mod m for a, b < m.
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        self.reduce(&(a * b))
    }

    /// a^2 mod m for a < m.
    pub fn sqr(&self, a: &BigUint) -> BigUint {
        self.reduce(&(a * a))
    }

    /// base^exp mod m, right-to-left binary: multiply the accumulator on set
    /// exponent bits, square the base every round, both through [`reduce`].
    ///
    /// [`reduce`]: BarrettReducer::reduce
    pub fn pow(&self, base: &BigUint, exp: &BigUint) -> BigUint {
        let mut result = BigUint::one();
        let mut base = base % &self.modulus;
        let mut exp = exp.clone();
        while !exp.is_zero() {
            if exp.is_odd() {
                result = self.mul(&result, &base);
            }
            base = self.sqr(&base);
            exp >>= 1u32;
        }
        result
    }
}
