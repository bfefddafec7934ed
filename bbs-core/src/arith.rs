//! Width-bounded helpers over `BigUint`.
//!
//! The modulus width N is a runtime value here rather than a compile-time
//! type parameter, so one binary serves every width. Carry, shift, and
//! comparison come from `num-bigint`; these helpers pin values to an N-bit
//! domain and convert them to and from wire bytes.

use num_bigint::BigUint;
use num_traits::One;

/// All-ones mask for an N-bit domain: 2^bits - 1.
pub fn mask(bits: u64) -> BigUint {
    (BigUint::one() << bits) - 1u32
}

/// floor(log2 n). Panics on zero.
pub fn ilog2(n: &BigUint) -> u64 {
    assert!(n > &BigUint::from(0u32), "ilog2 of zero");
    n.bits() - 1
}

/// Count of trailing zero bits; zero for n = 0.
pub fn trailing_zeros(n: &BigUint) -> u64 {
    n.trailing_zeros().unwrap_or(0)
}

/// Serialize to exactly ceil(bits/8) little-endian bytes.
pub fn to_le_bytes(n: &BigUint, bits: u64) -> Vec<u8> {
    debug_assert!(n.bits() <= bits, "value does not fit the stated width");
    let mut out = n.to_bytes_le();
    out.resize(((bits + 7) / 8) as usize, 0);
    out
}

/// Deserialize from little-endian bytes.
pub fn from_le_bytes(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_le(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_all_ones() {
        assert_eq!(mask(1), BigUint::from(1u32));
        assert_eq!(mask(8), BigUint::from(255u32));
        assert_eq!(mask(64), BigUint::from(u64::MAX));
        assert_eq!(mask(130).bits(), 130);
    }

    #[test]
    fn ilog2_matches_bit_length() {
        assert_eq!(ilog2(&BigUint::from(1u32)), 0);
        assert_eq!(ilog2(&BigUint::from(2u32)), 1);
        assert_eq!(ilog2(&BigUint::from(255u32)), 7);
        assert_eq!(ilog2(&BigUint::from(256u32)), 8);
    }

    #[test]
    fn trailing_zeros_counts_factors_of_two() {
        assert_eq!(trailing_zeros(&BigUint::from(0u32)), 0);
        assert_eq!(trailing_zeros(&BigUint::from(1u32)), 0);
        assert_eq!(trailing_zeros(&BigUint::from(96u32)), 5);
        assert_eq!(trailing_zeros(&(BigUint::one() << 200u32)), 200);
    }

    #[test]
    fn byte_round_trip_is_padded() {
        let value = BigUint::from(0x0102_0304u32);
        let bytes = to_le_bytes(&value, 64);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(from_le_bytes(&bytes), value);
    }
}
