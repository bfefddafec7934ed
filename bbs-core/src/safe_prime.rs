//! Sophie Germain safe-prime generation for BBS moduli.
//!
//! The modulus wants primes p = 2p' + 1 with p' itself prime and
//! p = 3 (mod 4): the quadratic residues mod p then form a subgroup of large
//! prime order p', which keeps the squaring orbit from collapsing into a
//! short cycle.
//!
//! Candidates are drawn as the cofactor p' in [0, 2^(N/2-2)) with the low two
//! bits forced, so p' = 3 (mod 4) and p = 2p' + 1 = 3 (mod 4) automatically.
//! The screens run cheapest first: the reciprocal sieve on p' and p, then
//! Miller-Rabin on p', then the base-2 Fermat check on p. With p' certified
//! prime, 2^(p-1) = 1 (mod p) proves p prime outright (every prime factor
//! of p would be = 1 mod p', impossible below p'^2), so p never needs its
//! own Miller-Rabin pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;

use num_bigint::BigUint;
use tracing::debug;

use crate::entropy::{self, EntropySource};
use crate::error::Result;
use crate::params::BbsParams;
use crate::primality::{self, MR_ROUNDS};
use crate::sieve::TrialSieve;

/// One sampling attempt. `Ok(None)` is an ordinary miss.
fn attempt<E: EntropySource + ?Sized>(
    cofactor_bits: u64,
    sieve: &TrialSieve,
    entropy: &mut E,
) -> Result<Option<BigUint>> {
    let cofactor = entropy::random_bits(entropy, cofactor_bits)? | BigUint::from(3u32);
    let candidate = (&cofactor << 1u32) + 1u32;
    if !sieve.may_be_prime(&cofactor) || !sieve.may_be_prime(&candidate) {
        return Ok(None);
    }
    if !primality::is_probably_prime(&cofactor, MR_ROUNDS, entropy)? {
        return Ok(None);
    }
    if !primality::fermat_base2(&candidate) {
        return Ok(None);
    }
    Ok(Some(candidate))
}

fn search_serial<E: EntropySource + ?Sized>(
    cofactor_bits: u64,
    sieve: &TrialSieve,
    entropy: &mut E,
    exclude: Option<&BigUint>,
) -> Result<BigUint> {
    let mut tried = 0u64;
    loop {
        tried += 1;
        if let Some(found) = attempt(cofactor_bits, sieve, entropy)? {
            if exclude == Some(&found) {
                continue;
            }
            debug!(tried, bits = found.bits(), "safe prime found");
            return Ok(found);
        }
    }
}

/// Race `workers` threads for one safe prime. Every worker polls the shared
/// `found` flag each iteration and bails once it flips; a winner re-checks
/// the flag under the result mutex before publishing, so exactly one result
/// lands even when several workers finish together. Entropy failures publish
/// through the same slot.
///
/// Each worker searches over its own [`fork`] of the caller's source, so a
/// deterministic source still gives every worker a distinct candidate
/// stream.
///
/// [`fork`]: EntropySource::fork
fn search_parallel<E: EntropySource + Send>(
    cofactor_bits: u64,
    sieve: &TrialSieve,
    entropy: &mut E,
    workers: usize,
    exclude: Option<&BigUint>,
) -> Result<BigUint> {
    let found = AtomicBool::new(false);
    let slot: Mutex<Option<Result<BigUint>>> = Mutex::new(None);
    let sources: Vec<E> = (0..workers).map(|_| entropy.fork()).collect();

    thread::scope(|scope| {
        for mut entropy in sources {
            let found = &found;
            let slot = &slot;
            scope.spawn(move || {
                while !found.load(Ordering::Relaxed) {
                    match attempt(cofactor_bits, sieve, &mut entropy) {
                        Ok(None) => continue,
                        Ok(Some(candidate)) => {
                            if exclude == Some(&candidate) {
                                continue;
                            }
                            let mut guard = slot.lock().unwrap();
                            if !found.load(Ordering::Relaxed) {
                                *guard = Some(Ok(candidate));
                                found.store(true, Ordering::Relaxed);
                            }
                            return;
                        }
                        Err(err) => {
                            let mut guard = slot.lock().unwrap();
                            if !found.load(Ordering::Relaxed) {
                                *guard = Some(Err(err));
                                found.store(true, Ordering::Relaxed);
                            }
                            return;
                        }
                    }
                }
            });
        }
    });

    slot.into_inner()
        .unwrap()
        .expect("search ended without a published result")
}

/// Generate the BBS prime pair: two distinct safe primes of roughly N/2 bits,
/// both = 3 (mod 4). The search for q starts only after p is fixed, which
/// makes the q != p constraint a plain comparison inside the loop.
///
/// The caller's source advances across the whole search; calling this twice
/// with the same live source yields two different pairs.
pub fn generate_pair<E: EntropySource + Send>(
    params: &BbsParams,
    entropy: &mut E,
) -> Result<(BigUint, BigUint)> {
    params.validate()?;
    let cofactor_bits = params.modulus_bits / 2 - 2;
    let sieve = TrialSieve::new(params.modulus_bits, params.sieve_primes);
    debug!(
        bits = params.modulus_bits,
        workers = params.workers,
        "searching for a safe prime pair"
    );

    if params.workers > 1 {
        let p = search_parallel(cofactor_bits, &sieve, entropy, params.workers, None)?;
        let q = search_parallel(cofactor_bits, &sieve, entropy, params.workers, Some(&p))?;
        Ok((p, q))
    } else {
        let p = search_serial(cofactor_bits, &sieve, entropy, None)?;
        let q = search_serial(cofactor_bits, &sieve, entropy, Some(&p))?;
        Ok((p, q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{SeededEntropy, SystemEntropy};
    use num_bigint::BigUint;

    fn assert_safe_pair(p: &BigUint, q: &BigUint) {
        let three = BigUint::from(3u32);
        assert_eq!(p % 4u32, three, "p must be 3 mod 4");
        assert_eq!(q % 4u32, three, "q must be 3 mod 4");
        assert_ne!(p, q);

        // the cofactors must be prime, checked through an independent path
        let mut entropy = SeededEntropy::from_seed(99);
        for n in [p, q] {
            let cofactor = (n - 1u32) >> 1u32;
            assert!(
                primality::is_probably_prime(&cofactor, MR_ROUNDS, &mut entropy).unwrap(),
                "(n - 1)/2 of {n} is not prime"
            );
            assert!(
                primality::is_probably_prime(n, MR_ROUNDS, &mut entropy).unwrap(),
                "{n} is not prime"
            );
        }
    }

    #[test]
    fn serial_search_yields_a_safe_pair() {
        let params = BbsParams::with_modulus_bits(64);
        let mut entropy = SeededEntropy::from_seed(17);
        let (p, q) = generate_pair(&params, &mut entropy).unwrap();
        assert_safe_pair(&p, &q);
        assert!((&p * &q).bits() <= 64);
    }

    #[test]
    fn serial_search_is_deterministic_under_a_fixed_seed() {
        let params = BbsParams::with_modulus_bits(64);
        let first = generate_pair(&params, &mut SeededEntropy::from_seed(23)).unwrap();
        let second = generate_pair(&params, &mut SeededEntropy::from_seed(23)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn a_live_source_advances_across_searches() {
        // the same handle must not replay its stream, so back-to-back pairs
        // from one source have to differ
        let params = BbsParams::with_modulus_bits(64);
        let mut entropy = SeededEntropy::from_seed(23);
        let first = generate_pair(&params, &mut entropy).unwrap();
        let second = generate_pair(&params, &mut entropy).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn parallel_search_yields_a_safe_pair() {
        let mut params = BbsParams::with_modulus_bits(64);
        params.workers = 4;
        let (p, q) = generate_pair(&params, &mut SystemEntropy).unwrap();
        assert_safe_pair(&p, &q);
    }

    #[test]
    fn parallel_search_over_a_seeded_source_yields_a_safe_pair() {
        // forked workers each search a distinct deterministic sub-stream
        let mut params = BbsParams::with_modulus_bits(64);
        params.workers = 4;
        let mut entropy = SeededEntropy::from_seed(29);
        let (p, q) = generate_pair(&params, &mut entropy).unwrap();
        assert_safe_pair(&p, &q);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut params = BbsParams::with_modulus_bits(64);
        params.workers = 0;
        assert!(generate_pair(&params, &mut SystemEntropy).is_err());
    }
}
