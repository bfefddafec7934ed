//! Shared fixtures for generator benchmarks: pre-mined safe-prime pairs at
//! several modulus widths, so benches and comparisons never pay for prime
//! generation.

use bbs_core::BbsGenerator;
use num_bigint::BigUint;

/// (target modulus width, p, q). Every pair is safe primes = 3 (mod 4); the
/// 256-bit entry is the documented test pair.
const PAIRS: &[(u64, &str, &str)] = &[
    (64, "4cab2d7", "2e0af5f7"),
    (128, "40544476cca8e4c7", "274d4fed4483ed1f"),
    (
        256,
        "5c5906be67a75ae0e321cfe8d4a77a7f",
        "1b218cd3e4bf641c6073e86b8e6b9687",
    ),
    (
        512,
        "698bb24d68cff2d2a9be947ffe66e95d352f8186a01f5e1ebdfb7ff0b432767",
        "7a7424a5e00fd014c700391bb227141552fb7ff35b5ed99d9a43f81d2bbfe4d7",
    ),
];

/// Widths with a fixture pair available.
pub fn fixture_widths() -> Vec<u64> {
    PAIRS.iter().map(|(width, _, _)| *width).collect()
}

/// A deterministic generator (seed x0 = 2, one bit per step) over the fixture
/// pair for `width`. Panics on widths without a fixture.
pub fn fixture_generator(width: u64) -> BbsGenerator {
    let (_, p_hex, q_hex) = PAIRS
        .iter()
        .find(|(w, _, _)| *w == width)
        .unwrap_or_else(|| panic!("no fixture pair at {width} bits"));
    let p = BigUint::parse_bytes(p_hex.as_bytes(), 16).expect("fixture prime p");
    let q = BigUint::parse_bytes(q_hex.as_bytes(), 16).expect("fixture prime q");
    BbsGenerator::from_parts(&p, &q, BigUint::from(2u32), 1).expect("fixture generator")
}
