//! Binary GCD (Stein's algorithm): only shifts, subtractions, comparisons.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::arith;

/// gcd(a, b) by Stein's algorithm. Returns 0 only when both inputs are 0.
pub fn binary_gcd(a: &BigUint, b: &BigUint) -> BigUint {
    if a.is_zero() {
        return b.clone();
    }
    if b.is_zero() {
        return a.clone();
    }
    let mut a = a.clone();
    let mut b = b.clone();
    let shift = arith::trailing_zeros(&a).min(arith::trailing_zeros(&b));
    a >>= arith::trailing_zeros(&a);
    // invariant: a odd
    loop {
        b >>= arith::trailing_zeros(&b);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        b -= &a;
        if b.is_zero() {
            return a << shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{random_bits, SeededEntropy};
    use num_integer::Integer;

    #[test]
    fn handles_zero_operands() {
        let zero = BigUint::zero();
        let n = BigUint::from(84u32);
        assert_eq!(binary_gcd(&zero, &zero), zero);
        assert_eq!(binary_gcd(&zero, &n), n);
        assert_eq!(binary_gcd(&n, &zero), n);
    }

    #[test]
    fn small_cases() {
        let g = |a: u32, b: u32| binary_gcd(&BigUint::from(a), &BigUint::from(b));
        assert_eq!(g(12, 18), BigUint::from(6u32));
        assert_eq!(g(17, 31), BigUint::from(1u32));
        assert_eq!(g(1024, 96), BigUint::from(32u32));
        assert_eq!(g(7, 7), BigUint::from(7u32));
    }

    #[test]
    fn agrees_with_the_reference_gcd() {
        let mut entropy = SeededEntropy::from_seed(13);
        for bits in [16u64, 64, 200] {
            for _ in 0..40 {
                let a = random_bits(&mut entropy, bits).unwrap();
                let b = random_bits(&mut entropy, bits).unwrap();
                assert_eq!(binary_gcd(&a, &b), a.gcd(&b), "a = {a}, b = {b}");
            }
        }
    }

    #[test]
    fn safe_prime_pair_shares_only_a_factor_of_two() {
        // p - 1 = 2p', q - 1 = 2q' with p', q' distinct odd primes
        let p1 = BigUint::from(23u32 - 1);
        let q1 = BigUint::from(47u32 - 1);
        assert_eq!(binary_gcd(&p1, &q1), BigUint::from(2u32));
    }
}
