//! # bbs-core
//!
//! A seekable Blum-Blum-Shub (BBS) pseudorandom bit generator.
//!
//! The generator squares a secret residue modulo M = p*q, where p and q are
//! distinct safe primes congruent to 3 mod 4, and emits the low bits of each
//! new residue. Because the seed is coprime to M, the residue after i steps
//! is `x0^(2^i mod c) mod M` with c the Carmichael exponent of M, so any
//! stream position is reachable in O(log i) multiplications: the stream can
//! be replayed, skipped, and rewound at will.
//!
//! This is a research implementation: the arithmetic is not constant-time,
//! and BBS is inherently slow at cryptographic widths. What it buys is a
//! security reduction to factoring M and exact random access.

pub mod arith;
pub mod barrett;
pub mod entropy;
pub mod error;
pub mod gcd;
pub mod generator;
pub mod params;
pub mod primality;
pub mod safe_prime;
pub mod sieve;

pub use entropy::{EntropySource, SeededEntropy, SystemEntropy};
pub use error::{BbsError, Result};
pub use generator::{BbsGenerator, GeneratorState};
pub use params::BbsParams;
pub use safe_prime::generate_pair;
