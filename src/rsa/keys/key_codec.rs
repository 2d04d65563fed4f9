//! Key string codec.
//!
//! Layout before Base64 (standard alphabet, padded):
//!
//! ```text
//! [u32 BE len(e)][e bytes][u32 BE len(n)][n bytes]
//! ```
//!
//! Both integers are written big-endian in two's complement, so a value
//! with its top bit set gains a leading zero byte. The length fields never
//! carry sign information.

use std::io::{Cursor, Read};
use num_bigint::BigUint;
use crate::rsa::{bigint, Result, RsaError};

const LEN_FIELD: usize = 4;

pub fn encode_key(exponent: &BigUint, modulus: &BigUint) -> String {
    let exponent = bigint::unsigned_to_bytes(exponent);
    let modulus = bigint::unsigned_to_bytes(modulus);
    let mut buf = Vec::with_capacity(2 * LEN_FIELD + exponent.len() + modulus.len());
    for field in [&exponent, &modulus] {
        buf.extend_from_slice(&(field.len() as u32).to_be_bytes());
        buf.extend_from_slice(field);
    }
    base64::encode_config(&buf, base64::STANDARD)
}

/// `(exponent, modulus)` from a key string.
pub fn decode_key(key: &str) -> Result<(BigUint, BigUint)> {
    let content = base64::decode_config(key.trim(), base64::STANDARD)
        .map_err(|e| RsaError::MalformedKey(format!("key is not valid Base64: {}", e)))?;
    let mut cur = Cursor::new(content.as_slice());
    let exponent = read_field(&mut cur, "exponent")?;
    let modulus = read_field(&mut cur, "modulus")?;
    let left = content.len() - cur.position() as usize;
    if left != 0 {
        return Err(RsaError::MalformedKey(format!("{} trailing bytes after modulus", left)));
    }
    Ok((exponent, modulus))
}

fn read_field(cur: &mut Cursor<&[u8]>, name: &str) -> Result<BigUint> {
    let mut len = [0u8; LEN_FIELD];
    cur.read_exact(&mut len)
        .map_err(|_| RsaError::MalformedKey(format!("truncated {} length", name)))?;
    let len = u32::from_be_bytes(len) as usize;
    let left = cur.get_ref().len() - cur.position() as usize;
    if len > left {
        return Err(RsaError::MalformedKey(format!(
            "{} declares {} bytes but only {} remain", name, len, left
        )));
    }
    let mut data = vec![0u8; len];
    cur.read_exact(&mut data)
        .map_err(|_| RsaError::MalformedKey(format!("truncated {}", name)))?;
    bigint::unsigned_from_bytes(&data)
        .ok_or_else(|| RsaError::MalformedKey(format!("{} is negative", name)))
}
