pub mod key_codec;
pub mod key_data;
pub mod key_store;

pub use key_codec::*;
pub use key_data::*;
pub use key_store::*;

use std::str::FromStr;
use num_bigint::BigUint;
use crate::rsa::RsaError;

/// One half of an RSA key pair: an exponent and the shared modulus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    exponent: BigUint,
    modulus: BigUint,
}

impl Key {
    pub fn new(exponent: BigUint, modulus: BigUint) -> Self {
        Self { exponent, modulus }
    }

    pub fn exponent(&self) -> &BigUint { &self.exponent }

    pub fn modulus(&self) -> &BigUint { &self.modulus }

    /// Base64 wire form, see [`encode_key`].
    pub fn encode(&self) -> String { encode_key(&self.exponent, &self.modulus) }

    pub fn decode(key: &str) -> crate::rsa::Result<Self> {
        let (exponent, modulus) = decode_key(key)?;
        Ok(Self { exponent, modulus })
    }
}

impl FromStr for Key {
    type Err = RsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Key::decode(s) }
}

#[derive(Debug, Clone)]
pub struct KeySet {
    pub public: Key,
    pub private: Key,
}

impl KeySet {
    /// `(public, private)` key strings.
    pub fn encode(&self) -> (String, String) {
        (self.public.encode(), self.private.encode())
    }
}
