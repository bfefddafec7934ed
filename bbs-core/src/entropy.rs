//! Byte sources for seeding and witness sampling.
//!
//! The generator never talks to the operating system directly; it pulls bytes
//! through [`EntropySource`] so tests and reproducible runs can substitute a
//! deterministic stream for the platform CSPRNG.

use num_bigint::BigUint;
use num_traits::Zero;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::arith;
use crate::error::{BbsError, Result};

/// A source of uniformly random octets.
///
/// A source is a single advancing stream: every `fill` consumes bytes the
/// next call will not see again. Racing workers must not share or duplicate
/// that stream; they take [`fork`]ed children instead.
///
/// [`fork`]: EntropySource::fork
pub trait EntropySource {
    /// Fill `buf` entirely with random bytes, advancing the stream.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Split off an independent child source for a racing worker.
    ///
    /// Stateful sources must advance themselves and derive a distinct
    /// sub-stream for each call, so sibling forks never replay each other's
    /// bytes.
    fn fork(&mut self) -> Self
    where
        Self: Sized;
}

/// Entropy backed by the operating system CSPRNG: `/dev/urandom` on UNIX, the
/// platform cryptographic provider elsewhere. The underlying handle is
/// process-global and safe for concurrent use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|source| BbsError::Entropy { source })
    }

    // every handle reads fresh OS bytes, so forks are trivially independent
    fn fork(&mut self) -> Self {
        SystemEntropy
    }
}

/// Deterministic entropy for reproducible runs and tests. Not suitable for
/// production seeding.
#[derive(Debug, Clone)]
pub struct SeededEntropy {
    rng: StdRng,
}

impl SeededEntropy {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.rng.fill_bytes(buf);
        Ok(())
    }

    // reseed the child from the parent stream; this advances the parent, so
    // successive forks diverge from each other and from the parent
    fn fork(&mut self) -> Self {
        SeededEntropy {
            rng: StdRng::seed_from_u64(self.rng.next_u64()),
        }
    }
}

/// Draw a uniform value in [0, 2^bits).
///
/// Pulls whole bytes and shifts off the excess, so every value in the window
/// is equally likely.
pub fn random_bits<E: EntropySource + ?Sized>(entropy: &mut E, bits: u64) -> Result<BigUint> {
    if bits == 0 {
        return Ok(BigUint::zero());
    }
    let nbytes = ((bits + 7) / 8) as usize;
    let mut buf = vec![0u8; nbytes];
    entropy.fill(&mut buf)?;
    let mut value = arith::from_le_bytes(&buf);
    let excess = nbytes as u64 * 8 - bits;
    if excess > 0 {
        value >>= excess;
    }
    Ok(value)
}

/// Draw a uniform value in [0, max) by rejection.
///
/// Samples the bit window of `max` and retries until the draw lands below it;
/// the acceptance rate is at least one half.
pub fn random_below<E: EntropySource + ?Sized>(entropy: &mut E, max: &BigUint) -> Result<BigUint> {
    debug_assert!(!max.is_zero());
    let bits = max.bits();
    loop {
        let value = random_bits(entropy, bits)?;
        if &value < max {
            return Ok(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_streams_are_reproducible() {
        let mut a = SeededEntropy::from_seed(42);
        let mut b = SeededEntropy::from_seed(42);
        let mut buf_a = [0u8; 32];
        let mut buf_b = [0u8; 32];
        a.fill(&mut buf_a).unwrap();
        b.fill(&mut buf_b).unwrap();
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn forked_seeded_streams_diverge() {
        let mut parent = SeededEntropy::from_seed(42);
        let mut first = parent.fork();
        let mut second = parent.fork();

        let mut buf_parent = [0u8; 32];
        let mut buf_first = [0u8; 32];
        let mut buf_second = [0u8; 32];
        parent.fill(&mut buf_parent).unwrap();
        first.fill(&mut buf_first).unwrap();
        second.fill(&mut buf_second).unwrap();

        assert_ne!(buf_first, buf_second, "sibling forks must not replay each other");
        assert_ne!(buf_parent, buf_first, "a fork must not replay the parent");
    }

    #[test]
    fn forking_advances_the_parent() {
        let mut forked = SeededEntropy::from_seed(42);
        forked.fork();
        let mut untouched = SeededEntropy::from_seed(42);

        let mut buf_forked = [0u8; 32];
        let mut buf_untouched = [0u8; 32];
        forked.fill(&mut buf_forked).unwrap();
        untouched.fill(&mut buf_untouched).unwrap();
        assert_ne!(buf_forked, buf_untouched);
    }

    #[test]
    fn random_bits_stays_in_window() {
        let mut entropy = SeededEntropy::from_seed(1);
        for bits in [1u64, 7, 8, 9, 63, 64, 65, 250] {
            for _ in 0..20 {
                let value = random_bits(&mut entropy, bits).unwrap();
                assert!(value.bits() <= bits, "{value} exceeds {bits} bits");
            }
        }
    }

    #[test]
    fn random_below_respects_the_bound() {
        let mut entropy = SeededEntropy::from_seed(2);
        let max = BigUint::from(1000u32);
        for _ in 0..200 {
            let value = random_below(&mut entropy, &max).unwrap();
            assert!(value < max);
        }
    }

    #[test]
    fn system_entropy_fills() {
        let mut entropy = SystemEntropy;
        let mut buf = [0u8; 64];
        entropy.fill(&mut buf).unwrap();
        // 64 zero bytes from a working CSPRNG is a 2^-512 event
        assert!(buf.iter().any(|&b| b != 0));
    }
}
