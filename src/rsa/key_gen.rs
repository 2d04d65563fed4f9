use num_bigint::{BigInt, BigUint};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use crate::rsa::prime_gen::fill_random;
use crate::rsa::{euler, mod_inverse, Key, KeySet, PrimeGenerator, Result, RsaError, PUBLIC_EXPONENT};

/// Smallest modulus size that still yields two distinct odd primes.
pub const MIN_KEY_SIZE: i64 = 16;

/// Prime pairs tried before giving up on an unlucky entropy stream.
pub const MAX_KEYGEN_ATTEMPTS: usize = 64;

/// How unevenly the modulus bits are shared between `p` and `q`.
///
/// `p` receives half the bits shifted by a random `±f * key_size`, with `f`
/// drawn from `[min_fraction, max_fraction]`; `q` gets the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimeSplit {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl Default for PrimeSplit {
    fn default() -> Self {
        Self { min_fraction: 0.20, max_fraction: 0.30 }
    }
}

impl PrimeSplit {
    pub fn new(min_fraction: f64, max_fraction: f64) -> Result<Self> {
        let split = Self { min_fraction, max_fraction };
        split.validate()?;
        Ok(split)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0 <= self.min_fraction && self.min_fraction <= self.max_fraction && self.max_fraction < 0.5) {
            return Err(RsaError::InvalidArgument(format!(
                "prime split [{}, {}] must satisfy 0 <= min <= max < 0.5",
                self.min_fraction, self.max_fraction
            )));
        }
        Ok(())
    }

    /// `(bits_p, bits_q)` summing to `key_size`, each at least two bits.
    pub fn split<R: RngCore + CryptoRng + ?Sized>(&self, key_size: i64, rng: &mut R) -> Result<(u64, u64)> {
        self.validate()?;
        if key_size < 4 {
            return Err(RsaError::InvalidArgument(format!("cannot split {} bits into two primes", key_size)));
        }
        let mut buf = [0u8; 8];
        fill_random(rng, &mut buf)?;
        let draw = u64::from_be_bytes(buf);
        // 53 high bits pick the fraction, the low bit picks the sign
        let unit = (draw >> 11) as f64 / (1u64 << 53) as f64;
        let fraction = self.min_fraction + unit * (self.max_fraction - self.min_fraction);
        let signed = if draw & 1 == 1 { -fraction } else { fraction };
        let bits_p = (key_size / 2 + (key_size as f64 * signed).floor() as i64).clamp(2, key_size - 2);
        Ok((bits_p as u64, (key_size - bits_p) as u64))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyPairGenerator {
    primes: PrimeGenerator,
    split: PrimeSplit,
}

impl KeyPairGenerator {
    pub fn new(primes: PrimeGenerator, split: PrimeSplit) -> Self {
        Self { primes, split }
    }

    pub fn primes(&self) -> &PrimeGenerator { &self.primes }

    pub fn split(&self) -> &PrimeSplit { &self.split }

    /// Encoded `(public, private)` key strings for a `key_size`-bit modulus.
    pub fn generate_key_pair<R: RngCore + CryptoRng + ?Sized>(&self, key_size: i64, rng: &mut R) -> Result<(String, String)> {
        Ok(self.generate_key_set(key_size, rng)?.encode())
    }

    /// Generates primes until `p != q` and `E` is invertible modulo the totient.
    pub fn generate_key_set<R: RngCore + CryptoRng + ?Sized>(&self, key_size: i64, rng: &mut R) -> Result<KeySet> {
        if key_size <= 0 {
            return Err(RsaError::InvalidArgument(format!("key size must be positive, got {}", key_size)));
        }
        if key_size < MIN_KEY_SIZE {
            return Err(RsaError::InvalidArgument(format!(
                "key size must be at least {} bits, got {}", MIN_KEY_SIZE, key_size
            )));
        }
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            let (p, q) = self.generate_primes(key_size, rng)?;
            if p == q { continue; }
            match derive_key_set(&p, &q) {
                Ok(keys) => return Ok(keys),
                Err(RsaError::InvalidArgument(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(RsaError::CryptoFailure(format!(
            "no usable prime pair after {} attempts", MAX_KEYGEN_ATTEMPTS
        )))
    }

    pub fn generate_primes<R: RngCore + CryptoRng + ?Sized>(&self, key_size: i64, rng: &mut R) -> Result<(BigUint, BigUint)> {
        let (bits_p, bits_q) = self.split.split(key_size, rng)?;
        let p = self.primes.generate_prime(bits_p, rng)?;
        let q = self.primes.generate_prime(bits_q, rng)?;
        Ok((p, q))
    }
}

/// Public and private keys for the primes `p` and `q`.
///
/// Fails with `InvalidArgument` when the public exponent shares a factor
/// with the totient.
pub fn derive_key_set(p: &BigUint, q: &BigUint) -> Result<KeySet> {
    let n = p * q;
    let f = BigInt::from(euler(p, q));
    let e = BigUint::from(PUBLIC_EXPONENT);
    let d = mod_inverse(&BigInt::from(e.clone()), &f)?;
    let (_, d) = d.into_parts();
    Ok(KeySet { public: Key::new(e, n.clone()), private: Key::new(d, n) })
}

/// Key pair from the operating system's secure generator and default policy.
pub fn generate_key_pair(key_size: i64) -> Result<(String, String)> {
    KeyPairGenerator::default().generate_key_pair(key_size, &mut OsRng)
}
