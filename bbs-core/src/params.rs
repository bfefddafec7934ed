//! Generator build parameters.

use serde::{Deserialize, Serialize};

use crate::error::{BbsError, Result};
use crate::sieve::DEFAULT_SIEVE_PRIMES;

/// Tunable knobs for constructing a generator.
///
/// The defaults match the reference configuration: a 1024-bit modulus, one
/// output bit per squaring, the 99-prime sieve fast path, and a serial prime
/// search. For tangible security push `modulus_bits` to 8192; 512 is plenty
/// for demonstration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BbsParams {
    /// Target bit width N of the modulus M = p*q. Primes are drawn at about
    /// N/2 bits each, so M lands just under 2^N.
    pub modulus_bits: u64,
    /// Output bits taken per squaring step. The classical security argument
    /// allows up to floor(log2 log2 M); anything above 1 trades that margin for
    /// throughput.
    pub extract_bits: u32,
    /// How many small primes screen each candidate before Miller-Rabin.
    pub sieve_primes: usize,
    /// Worker threads racing the safe-prime search; 1 searches serially.
    pub workers: usize,
}

impl Default for BbsParams {
    fn default() -> Self {
        Self {
            modulus_bits: 1024,
            extract_bits: 1,
            sieve_primes: DEFAULT_SIEVE_PRIMES,
            workers: 1,
        }
    }
}

impl BbsParams {
    /// Defaults at a caller-chosen modulus width.
    pub fn with_modulus_bits(bits: u64) -> Self {
        Self {
            modulus_bits: bits,
            ..Self::default()
        }
    }

    /// Reject widths too small to host two safe primes, extraction rates
    /// beyond the security bound, and degenerate knob values.
    pub fn validate(&self) -> Result<()> {
        if self.modulus_bits < 32 {
            return Err(BbsError::invalid(format!(
                "modulus width {} is too small; need at least 32 bits",
                self.modulus_bits
            )));
        }
        if self.modulus_bits % 2 != 0 {
            return Err(BbsError::invalid(format!(
                "modulus width {} must be even",
                self.modulus_bits
            )));
        }
        if self.extract_bits == 0 {
            return Err(BbsError::invalid("extract_bits must be at least 1"));
        }
        let cap = extract_cap(self.modulus_bits - 1);
        if self.extract_bits > cap {
            return Err(BbsError::invalid(format!(
                "extract_bits {} exceeds floor(log2 log2 M) = {} for {}-bit moduli",
                self.extract_bits, cap, self.modulus_bits
            )));
        }
        if self.sieve_primes == 0 {
            return Err(BbsError::invalid("sieve_primes must be at least 1"));
        }
        if self.workers == 0 {
            return Err(BbsError::invalid("workers must be at least 1"));
        }
        Ok(())
    }
}

/// floor(log2 log2 M) given floor(log2 M).
pub(crate) fn extract_cap(floor_log2_m: u64) -> u32 {
    floor_log2_m.max(2).ilog2()
}
