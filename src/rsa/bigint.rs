//! Big-endian two's-complement byte interop for big integers.
//!
//! Every integer that crosses a byte boundary in this crate (key fields,
//! random candidates, ciphertexts) goes through here, so the encoder and the
//! decoder always agree on sign handling: a non-negative value whose top
//! magnitude bit is set carries one extra leading `0x00`.

use num_bigint::{BigInt, BigUint};

pub fn to_bytes(value: &BigInt) -> Vec<u8> { value.to_signed_bytes_be() }

pub fn from_bytes(bytes: &[u8]) -> BigInt { BigInt::from_signed_bytes_be(bytes) }

pub fn unsigned_to_bytes(value: &BigUint) -> Vec<u8> {
    let magnitude = value.to_bytes_be();
    match magnitude.first() {
        Some(b) if b & 0x80 != 0 => {
            let mut res = Vec::with_capacity(magnitude.len() + 1);
            res.push(0);
            res.extend_from_slice(&magnitude);
            res
        }
        _ => magnitude,
    }
}

/// `None` when the bytes encode a negative number.
pub fn unsigned_from_bytes(bytes: &[u8]) -> Option<BigUint> { from_bytes(bytes).to_biguint() }
