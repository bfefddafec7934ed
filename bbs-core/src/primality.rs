//! Probabilistic primality testing over Barrett-reduced arithmetic.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;

use crate::arith;
use crate::barrett::BarrettReducer;
use crate::entropy::{self, EntropySource};
use crate::error::Result;

/// Miller-Rabin rounds used throughout prime generation. 64 rounds bound the
/// error rate by 2^-128.
pub const MR_ROUNDS: u32 = 64;

/// Write n - 1 = 2^s * d with d odd.
fn decompose(n: &BigUint) -> (u64, BigUint) {
    let mut d = n - 1u32;
    let s = arith::trailing_zeros(&d);
    d >>= s;
    (s, d)
}

/// Miller-Rabin with `rounds` random witnesses drawn from `entropy`.
///
/// Witnesses are sampled uniformly from [2, n-2]: draw the bit window of
/// n - 3, reject until the value lands below it, add 2. Never misclassifies a
/// prime; passes a composite with probability at most 4^-rounds.
pub fn is_probably_prime<E: EntropySource + ?Sized>(
    n: &BigUint,
    rounds: u32,
    entropy: &mut E,
) -> Result<bool> {
    let two = BigUint::from(2u32);
    let three = BigUint::from(3u32);
    if n < &two {
        return Ok(false);
    }
    if *n == two || *n == three {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }

    let (s, d) = decompose(n);
    let n_minus_1 = n - 1u32;
    let n_minus_3 = n - 3u32;
    let reducer = BarrettReducer::new(n);

    'witness: for _ in 0..rounds {
        let a = &two + entropy::random_below(entropy, &n_minus_3)?;
        let mut x = reducer.pow(&a, &d);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 1..s {
            x = reducer.sqr(&x);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// Fermat test to base 2: does 2^(n-1) = 1 (mod n) hold?
///
/// Alone this is weaker than Miller-Rabin (it passes base-2 pseudoprimes like
/// 341), but for n = 2k + 1 with k already certified prime it is a proof:
/// every prime factor of n would then be = 1 (mod k), impossible below k^2.
/// The safe-prime search leans on exactly that.
pub fn fermat_base2(n: &BigUint) -> bool {
    debug_assert!(n.is_odd() && n > &BigUint::from(1u32));
    let reducer = BarrettReducer::new(n);
    reducer
        .pow(&BigUint::from(2u32), &(n - 1u32))
        .is_one()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SeededEntropy;

    fn check(n: u64) -> bool {
        let mut entropy = SeededEntropy::from_seed(5);
        is_probably_prime(&BigUint::from(n), MR_ROUNDS, &mut entropy).unwrap()
    }

    #[test]
    fn classifies_small_numbers() {
        assert!(!check(0));
        assert!(!check(1));
        assert!(check(2));
        assert!(check(3));
        assert!(!check(4));
        assert!(check(5));
        assert!(check(7919));
        assert!(!check(7917));
    }

    #[test]
    fn rejects_carmichael_numbers() {
        // composites that fool the plain Fermat test for every coprime base
        for n in [561u64, 1105, 1729, 2465, 6601] {
            assert!(!check(n), "{n} is a Carmichael number");
        }
    }

    #[test]
    fn accepts_the_documented_pair() {
        let mut entropy = SeededEntropy::from_seed(6);
        let p = BigUint::parse_bytes(b"5c5906be67a75ae0e321cfe8d4a77a7f", 16).unwrap();
        let q = BigUint::parse_bytes(b"1b218cd3e4bf641c6073e86b8e6b9687", 16).unwrap();
        assert!(is_probably_prime(&p, MR_ROUNDS, &mut entropy).unwrap());
        assert!(is_probably_prime(&q, MR_ROUNDS, &mut entropy).unwrap());
        assert!(!is_probably_prime(&(p * q), 16, &mut entropy).unwrap());
    }

    #[test]
    fn fermat_is_weaker_than_miller_rabin() {
        // 341 = 11 * 31 is the smallest base-2 Fermat pseudoprime
        assert!(fermat_base2(&BigUint::from(341u32)));
        assert!(!check(341));
        assert!(fermat_base2(&BigUint::from(7u32)));
        assert!(!fermat_base2(&BigUint::from(15u32)));
    }

    #[test]
    fn decompose_splits_powers_of_two() {
        let (s, d) = decompose(&BigUint::from(97u32)); // 96 = 2^5 * 3
        assert_eq!(s, 5);
        assert_eq!(d, BigUint::from(3u32));
    }
}
