//! Textbook RSA over a single block.
//!
//! The whole message is read as one unsigned big-endian integer and must be
//! smaller than the modulus. There is no padding and no chunking; leading
//! zero bytes of a plaintext do not survive the round trip.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use crate::rsa::{bigint, fast_modular_exponent, Key, Result, RsaError};

impl Key {
    /// `value^exponent mod modulus`, refusing values that do not fit one block.
    pub fn apply(&self, value: &BigUint) -> Result<BigUint> {
        if value >= self.modulus() {
            return Err(RsaError::CryptoFailure(format!(
                "data length is larger than modulus ({} bits >= {} bits)",
                value.bits(), self.modulus().bits()
            )));
        }
        Ok(fast_modular_exponent(value, self.exponent(), self.modulus()))
    }
}

fn usable_key(key: &str) -> Result<Key> {
    let key = Key::decode(key)?;
    if key.modulus() <= &BigUint::one() {
        return Err(RsaError::MalformedKey("modulus must be greater than one".to_string()));
    }
    Ok(key)
}

/// Encrypts `plain` with a public key string, returning Base64 ciphertext.
pub fn encrypt(plain: &[u8], public_key: &str) -> Result<String> {
    let key = usable_key(public_key)?;
    let m = BigUint::from_bytes_be(plain);
    let c = key.apply(&m)?;
    Ok(base64::encode_config(bigint::unsigned_to_bytes(&c), base64::STANDARD))
}

/// Decrypts Base64 ciphertext with a private key string.
pub fn decrypt(cipher: &str, private_key: &str) -> Result<Vec<u8>> {
    let key = usable_key(private_key)?;
    let raw = base64::decode_config(cipher.trim(), base64::STANDARD)
        .map_err(|e| RsaError::CryptoFailure(format!("ciphertext is not valid Base64: {}", e)))?;
    let c = bigint::unsigned_from_bytes(&raw)
        .ok_or_else(|| RsaError::CryptoFailure("ciphertext decodes to a negative number".to_string()))?;
    let m = key.apply(&c)?;
    if m.is_zero() {
        return Ok(Vec::new());
    }
    Ok(m.to_bytes_be())
}

pub fn encrypt_text(plain: &str, public_key: &str) -> Result<String> {
    encrypt(plain.as_bytes(), public_key)
}

pub fn decrypt_text(cipher: &str, private_key: &str) -> Result<String> {
    let plain = decrypt(cipher, private_key)?;
    String::from_utf8(plain)
        .map_err(|_| RsaError::CryptoFailure("decrypted bytes are not UTF-8 text".to_string()))
}
