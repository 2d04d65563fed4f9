use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};
use thiserror::Error;

pub mod bigint;
pub mod cipher;
pub mod config;
pub mod key_gen;
pub mod keys;
pub mod message;
pub mod prime_gen;

pub use cipher::*;
pub use key_gen::*;
pub use keys::*;
pub use message::*;
pub use prime_gen::*;

/// Public exponent shared by every generated key pair.
pub const PUBLIC_EXPONENT: u32 = 65537;

#[derive(Debug, Error)]
pub enum RsaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("crypto failure: {0}")]
    CryptoFailure(String),

    #[error("secure random source unavailable: {0}")]
    EntropySourceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, RsaError>;

/// Square-and-multiply `a^q mod n`.
pub fn fast_modular_exponent(a: &BigUint, q: &BigUint, n: &BigUint) -> BigUint {
    let mut r = BigUint::one() % n;
    let mut a = a % n;
    let mut q = q.clone();
    while !q.is_zero() {
        if q.bit(0) { r = (r * &a) % n; }
        q >>= 1;
        a = (&a * &a) % n;
    }
    r
}

/// Totient of `p * q` for primes `p` and `q`.
pub fn euler(p: &BigUint, q: &BigUint) -> BigUint { (p - 1u32) * (q - 1u32) }

/// Inverse of `a` modulo `n` by the iterative extended Euclidean algorithm.
///
/// Fails when either input is not positive or when `gcd(a, n) != 1`, in
/// which case no inverse exists.
pub fn mod_inverse(a: &BigInt, n: &BigInt) -> Result<BigInt> {
    if !a.is_positive() || !n.is_positive() {
        return Err(RsaError::InvalidArgument(format!(
            "mod_inverse needs positive operands, got a={}, n={}", a, n
        )));
    }
    let mut a = a.clone();
    let mut i = n.clone();
    let mut v = BigInt::zero();
    let mut d = BigInt::one();
    while a.is_positive() {
        let t = &i / &a;
        let next_a = &i % &a;
        i = std::mem::replace(&mut a, next_a);
        let next_d = &v - &t * &d;
        v = std::mem::replace(&mut d, next_d);
    }
    // `i` now holds gcd(a, n)
    if !i.is_one() {
        return Err(RsaError::InvalidArgument(format!(
            "no inverse exists, operands share the factor {}", i
        )));
    }
    let mut v = v % n;
    if v.is_negative() { v += n; }
    Ok(v)
}
