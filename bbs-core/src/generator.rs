//! The Blum-Blum-Shub state machine: seed, square, extract, seek.
//!
//! State advances by x <- x^2 mod M and the stream is the low bits of each new
//! residue. Since gcd(x0, M) = 1 and the Carmichael exponent
//! c = lcm(p-1, q-1) satisfies x0^c = 1 (mod M), the residue after i steps
//! equals x0^(2^i mod c) mod M, so `seek` reaches any position in O(log i)
//! multiplications instead of i squarings.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arith;
use crate::barrett::BarrettReducer;
use crate::entropy::{self, EntropySource};
use crate::error::{BbsError, Result};
use crate::gcd::binary_gcd;
use crate::params::{self, BbsParams};
use crate::safe_prime;

/// A seekable BBS bit stream over a safe-prime modulus.
///
/// Exclusive-writer: one instance drives one stream. Callers wanting parallel
/// streams build separate generators.
#[derive(Debug, Clone)]
pub struct BbsGenerator {
    modulus: BigUint,
    seed: BigUint,
    x: BigUint,
    carmichael: BigUint,
    pos: u64,
    reducer: BarrettReducer,
    exponent_reducer: BarrettReducer,
    extract: u32,
}

/// Everything needed to reconstruct a generator: (M, x0, c, pos, extract).
/// The primes themselves are not part of the state; seeking only needs c.
///
/// The serialized form is whatever serde produces for these fields; it is a
/// convenience, not a stability promise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub modulus: BigUint,
    pub seed: BigUint,
    pub carmichael: BigUint,
    pub position: u64,
    pub extract_bits: u32,
}

fn is_three_mod_four(n: &BigUint) -> bool {
    n % 4u32 == BigUint::from(3u32)
}

fn validate_primes(p: &BigUint, q: &BigUint) -> Result<()> {
    let three = BigUint::from(3u32);
    if p <= &three || q <= &three {
        return Err(BbsError::invalid("primes must exceed 3"));
    }
    if !is_three_mod_four(p) || !is_three_mod_four(q) {
        return Err(BbsError::invalid("both primes must be 3 mod 4"));
    }
    if p == q {
        return Err(BbsError::invalid("the primes must be distinct"));
    }
    Ok(())
}

impl BbsGenerator {
    /// Generate a fresh safe-prime pair per `params` and seed from `entropy`.
    ///
    /// The same handle drives the prime search and then the seed sampling,
    /// so the source advances continuously across construction.
    pub fn new<E: EntropySource + Send>(params: &BbsParams, entropy: &mut E) -> Result<Self> {
        params.validate()?;
        let (p, q) = safe_prime::generate_pair(params, entropy)?;
        Self::from_primes(&p, &q, params.extract_bits, entropy)
    }

    /// Build over an existing safe-prime pair, sampling a seed coprime to
    /// M from `entropy` by rejection: x0 in [2, M) with x0 mod p != 0 and
    /// x0 mod q != 0.
    pub fn from_primes<E: EntropySource + ?Sized>(
        p: &BigUint,
        q: &BigUint,
        extract_bits: u32,
        entropy: &mut E,
    ) -> Result<Self> {
        validate_primes(p, q)?;
        let modulus = p * q;
        let one = BigUint::one();
        let seed = loop {
            let x = entropy::random_below(entropy, &modulus)?;
            if x <= one {
                continue;
            }
            if (&x % p).is_zero() || (&x % q).is_zero() {
                continue;
            }
            break x;
        };
        Self::from_parts(p, q, seed, extract_bits)
    }

    /// Build from an explicit (p, q, x0) triple. Deterministic; this is the
    /// path for known-answer streams and fixtures. The primes are taken on
    /// faith; only congruence, distinctness, and the seed constraints are
    /// checked.
    pub fn from_parts(
        p: &BigUint,
        q: &BigUint,
        seed: BigUint,
        extract_bits: u32,
    ) -> Result<Self> {
        validate_primes(p, q)?;
        let modulus = p * q;
        if seed <= BigUint::one() || seed >= modulus {
            return Err(BbsError::invalid("seed must lie strictly between 1 and M"));
        }
        if (&seed % p).is_zero() || (&seed % q).is_zero() {
            return Err(BbsError::invalid("seed shares a factor with the modulus"));
        }
        let p1 = p - 1u32;
        let q1 = q - 1u32;
        let carmichael = (&p1 * &q1) / binary_gcd(&p1, &q1);
        Self::assemble(modulus, seed, carmichael, 0, extract_bits)
    }

    /// Reconstruct a generator from a snapshot, replaying the seek to the
    /// recorded position.
    pub fn resume(state: &GeneratorState) -> Result<Self> {
        if state.seed <= BigUint::one() || state.seed >= state.modulus {
            return Err(BbsError::invalid("seed must lie strictly between 1 and M"));
        }
        if !binary_gcd(&state.seed, &state.modulus).is_one() {
            return Err(BbsError::invalid("seed shares a factor with the modulus"));
        }
        if state.carmichael <= BigUint::one() {
            return Err(BbsError::invalid("carmichael exponent must exceed 1"));
        }
        Self::assemble(
            state.modulus.clone(),
            state.seed.clone(),
            state.carmichael.clone(),
            state.position,
            state.extract_bits,
        )
    }

    fn assemble(
        modulus: BigUint,
        seed: BigUint,
        carmichael: BigUint,
        position: u64,
        extract_bits: u32,
    ) -> Result<Self> {
        let cap = params::extract_cap(arith::ilog2(&modulus));
        if extract_bits == 0 || extract_bits > cap {
            return Err(BbsError::invalid(format!(
                "extract_bits {extract_bits} outside [1, {cap}] for this modulus"
            )));
        }
        let reducer = BarrettReducer::new(&modulus);
        let exponent_reducer = BarrettReducer::new(&carmichael);
        debug!(
            modulus_bits = modulus.bits(),
            extract_bits, position, "generator assembled"
        );
        let mut generator = Self {
            x: seed.clone(),
            seed,
            modulus,
            carmichael,
            pos: 0,
            reducer,
            exponent_reducer,
            extract: extract_bits,
        };
        if position > 0 {
            generator.seek(position);
        }
        Ok(generator)
    }

    /// Snapshot the full state.
    pub fn state(&self) -> GeneratorState {
        GeneratorState {
            modulus: self.modulus.clone(),
            seed: self.seed.clone(),
            carmichael: self.carmichael.clone(),
            position: self.pos,
            extract_bits: self.extract,
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// The seed x0.
    pub fn seed(&self) -> &BigUint {
        &self.seed
    }

    /// The current residue x = x0^(2^pos) mod M.
    pub fn residue(&self) -> &BigUint {
        &self.x
    }

    /// How many squaring steps separate x from x0.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn extract_bits(&self) -> u32 {
        self.extract
    }

    /// One squaring step: x <- x^2 mod M.
    pub fn step(&mut self) {
        self.x = self.reducer.sqr(&self.x);
        self.pos += 1;
    }

    /// Jump to stream position i: x <- x0^(2^i mod c) mod M.
    ///
    /// The exponent reduces mod c first, so positions far beyond c cost the
    /// same O(log i) work. seek(0) restores the seed exactly.
    pub fn seek(&mut self, position: u64) {
        let exponent = self
            .exponent_reducer
            .pow(&BigUint::from(2u32), &BigUint::from(position));
        self.x = self.reducer.pow(&self.seed, &exponent);
        self.pos = position;
    }

    /// Step once and emit the low bit of the new residue.
    pub fn next_bit(&mut self) -> u8 {
        self.step();
        if self.x.bit(0) {
            1
        } else {
            0
        }
    }

    /// The next `count` bits of the stream, packed MSB-first: the first bit
    /// produced is the highest bit of the result.
    ///
    /// Bits come in EXTRACT-sized chunks while more than EXTRACT remain, then
    /// one per step for the tail.
    pub fn next_bits(&mut self, count: u32) -> BigUint {
        let chunk_mask = BigUint::from((1u64 << self.extract) - 1);
        let mut out = BigUint::zero();
        let mut remaining = count;
        while remaining > self.extract {
            self.step();
            out = (out << self.extract) | (&self.x & &chunk_mask);
            remaining -= self.extract;
        }
        while remaining > 0 {
            self.step();
            out <<= 1u32;
            if self.x.bit(0) {
                out |= BigUint::one();
            }
            remaining -= 1;
        }
        out
    }

    /// The next 64 stream bits as an unsigned word.
    pub fn next_u64(&mut self) -> u64 {
        self.next_word(64)
    }

    /// Fill `buf` with the next 8*len stream bits, MSB-first within each
    /// byte.
    pub fn next_bytes(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.next_word(8) as u8;
        }
    }

    fn next_word(&mut self, count: u32) -> u64 {
        debug_assert!(count <= 64);
        let chunk_mask = (1u64 << self.extract) - 1;
        let mut out = 0u64;
        let mut remaining = count;
        while remaining > self.extract {
            self.step();
            out = (out << self.extract) | (low_u64(&self.x) & chunk_mask);
            remaining -= self.extract;
        }
        while remaining > 0 {
            self.step();
            out = (out << 1) | (low_u64(&self.x) & 1);
            remaining -= 1;
        }
        out
    }
}

fn low_u64(n: &BigUint) -> u64 {
    n.iter_u64_digits().next().unwrap_or(0)
}
