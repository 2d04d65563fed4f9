use num::Integer;
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed};
use rand::{CryptoRng, RngCore};
use crate::rsa::{bigint, fast_modular_exponent, Result, RsaError};

/// Miller-Rabin witness rounds used unless configured otherwise.
pub const DEFAULT_ROUNDS: u32 = 10;

/// Fill `buf` from the secure source, surfacing source failures as errors.
pub(crate) fn fill_random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, buf: &mut [u8]) -> Result<()> {
    rng.try_fill_bytes(buf)
        .map_err(|e| RsaError::EntropySourceUnavailable(e.to_string()))
}

/// Random integer in `[min, max)`.
///
/// Draws as many bytes as the two's-complement form of `max - min`, reads
/// them back as a signed number and folds the absolute value into the range.
/// The result is close to uniform, not exactly uniform.
pub fn generate_random_bigint<R: RngCore + CryptoRng + ?Sized>(min: &BigInt, max: &BigInt, rng: &mut R) -> Result<BigInt> {
    let range = max - min;
    if range < BigInt::from(2) {
        return Err(RsaError::InvalidArgument(format!(
            "random range [{}, {}) is too narrow", min, max
        )));
    }
    let mut buf = bigint::to_bytes(&range);
    fill_random(rng, &mut buf)?;
    let sample = bigint::from_bytes(&buf).abs() % &range;
    Ok(min + sample)
}

/// Miller-Rabin probabilistic primality test with `witnesses` random bases.
///
/// A `true` answer is wrong with probability at most `4^-witnesses`; a
/// `false` answer is always right. At least one witness is required.
pub fn is_probably_prime<R: RngCore + CryptoRng + ?Sized>(value: &BigUint, witnesses: u32, rng: &mut R) -> Result<bool> {
    if witnesses == 0 {
        return Err(RsaError::InvalidArgument("Miller-Rabin needs at least one witness round".to_string()));
    }
    let two = BigUint::from(2u32);
    let three = BigUint::from(3u32);
    if *value == two || *value == three { return Ok(true); }
    if *value <= BigUint::one() || value.is_even() { return Ok(false); }

    let n_minus_one = value - 1u32;
    let mut d = n_minus_one.clone();
    let mut r = 0u64;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    // bases come from [2, value - 2]
    let low = BigInt::from(2);
    let high = BigInt::from(n_minus_one.clone());
    for _ in 0..witnesses {
        let (_, a) = generate_random_bigint(&low, &high, rng)?.into_parts();
        let mut x = fast_modular_exponent(&a, &d, value);
        if x.is_one() || x == n_minus_one { continue; }
        for _ in 1..r {
            x = (&x * &x) % value;
            if x.is_one() { return Ok(false); }
            if x == n_minus_one { break; }
        }
        if x != n_minus_one { return Ok(false); }
    }
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeGenerator {
    rounds: u32,
}

impl Default for PrimeGenerator {
    fn default() -> Self { Self::new(DEFAULT_ROUNDS) }
}

impl PrimeGenerator {
    pub fn new(rounds: u32) -> Self { Self { rounds } }

    pub fn rounds(&self) -> u32 { self.rounds }

    /// Random odd integer with exactly `bits` significant bits.
    ///
    /// One spare zero byte leads the buffer so the two's-complement decode
    /// is never negative; the top requested bit and the low bit are forced.
    pub fn generate_random_odd<R: RngCore + CryptoRng + ?Sized>(&self, bits: u64, rng: &mut R) -> Result<BigUint> {
        if bits == 0 {
            return Err(RsaError::InvalidArgument("prime size must be at least one bit".to_string()));
        }
        let magnitude = ((bits + 7) / 8) as usize;
        let mut buf = vec![0u8; magnitude + 1];
        fill_random(rng, &mut buf)?;
        buf[0] = 0;
        let top_bits = (bits - (magnitude as u64 - 1) * 8) as u32;
        buf[1] &= ((1u16 << top_bits) - 1) as u8;
        buf[1] |= 1 << (top_bits - 1);
        buf[magnitude] |= 1;
        bigint::unsigned_from_bytes(&buf)
            .ok_or_else(|| RsaError::CryptoFailure("random candidate decoded as negative".to_string()))
    }

    /// First probable prime at or above a random odd `bits`-bit start, stepping by two.
    pub fn generate_prime<R: RngCore + CryptoRng + ?Sized>(&self, bits: u64, rng: &mut R) -> Result<BigUint> {
        let mut candidate = self.generate_random_odd(bits, rng)?;
        while !self.is_probably_prime(&candidate, rng)? {
            candidate += 2u32;
        }
        Ok(candidate)
    }

    pub fn is_probably_prime<R: RngCore + CryptoRng + ?Sized>(&self, value: &BigUint, rng: &mut R) -> Result<bool> {
        is_probably_prime(value, self.rounds, rng)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use num::Integer;
    use num_bigint::{BigInt, BigUint};
    use rand::rngs::StdRng;
    use rand::{CryptoRng, RngCore, SeedableRng};
    use crate::rsa::RsaError;
    use super::{generate_random_bigint, is_probably_prime, PrimeGenerator, DEFAULT_ROUNDS};

    /// Source that always fails, standing in for an unavailable OS generator.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 { 0 }
        fn next_u64(&mut self) -> u64 { 0 }
        fn fill_bytes(&mut self, _dest: &mut [u8]) {}
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy pool closed"))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn test_miller_rabin_known_values() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(7);
        for p in [2u32, 3, 5, 7, 104729] {
            assert!(is_probably_prime(&BigUint::from(p), DEFAULT_ROUNDS, &mut rng)?, "{} is prime", p);
        }
        for c in [0u32, 1, 4, 9, 15, 100, 561, 104730] {
            assert!(!is_probably_prime(&BigUint::from(c), DEFAULT_ROUNDS, &mut rng)?, "{} is composite", c);
        }
        Ok(())
    }

    fn trial_division(n: u32) -> bool {
        let n = n as u64;
        n >= 2 && (2u64..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    #[test]
    fn test_miller_rabin_range() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(11);
        for x in (0xffff_ff00u32..0xffff_ffffu32).chain(0..2000) {
            let probable = is_probably_prime(&BigUint::from(x), DEFAULT_ROUNDS, &mut rng)?;
            assert_eq!(probable, trial_division(x), "disagreement on {}", x);
        }
        Ok(())
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let mut rng = StdRng::seed_from_u64(13);
        for v in [2u32, 9, 104729] {
            assert!(matches!(
                is_probably_prime(&BigUint::from(v), 0, &mut rng),
                Err(RsaError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            PrimeGenerator::new(0).generate_prime(64, &mut rng),
            Err(RsaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_random_odd_bits() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(1);
        let gen = PrimeGenerator::default();
        for bits in [1u64, 2, 7, 8, 9, 12, 64, 100, 257] {
            for _ in 0..20 {
                let v = gen.generate_random_odd(bits, &mut rng)?;
                assert_eq!(v.bits(), bits, "size of {}", v);
                assert!(v.is_odd());
            }
        }
        Ok(())
    }

    #[test]
    fn test_random_odd_zero_bits() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            PrimeGenerator::default().generate_random_odd(0, &mut rng),
            Err(RsaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn gen_prime() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(42);
        let gen = PrimeGenerator::default();
        for bits in [2u64, 16, 64, 128] {
            let prime = gen.generate_prime(bits, &mut rng)?;
            assert!(prime.bits() >= bits);
            assert!(gen.is_probably_prime(&prime, &mut rng)?);
        }
        Ok(())
    }

    #[test]
    fn test_random_range() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(3);
        let (min, max) = (BigInt::from(-5), BigInt::from(300));
        for _ in 0..500 {
            let v = generate_random_bigint(&min, &max, &mut rng)?;
            assert!(v >= min && v < max, "{} out of range", v);
        }
        Ok(())
    }

    #[test]
    fn test_random_range_too_narrow() {
        let mut rng = StdRng::seed_from_u64(3);
        for (min, max) in [(5, 6), (5, 5), (9, 2)] {
            assert!(matches!(
                generate_random_bigint(&BigInt::from(min), &BigInt::from(max), &mut rng),
                Err(RsaError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_broken_entropy_source() {
        let gen = PrimeGenerator::default();
        assert!(matches!(
            gen.generate_prime(64, &mut BrokenRng),
            Err(RsaError::EntropySourceUnavailable(_))
        ));
        assert!(matches!(
            is_probably_prime(&BigUint::from(104729u32), 1, &mut BrokenRng),
            Err(RsaError::EntropySourceUnavailable(_))
        ));
    }
}
