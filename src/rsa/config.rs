use std::path::PathBuf;
use lazy_static::lazy_static;
use crate::rsa::keys::KeyStore;
use crate::rsa::{KeyPairGenerator, PrimeGenerator, PrimeSplit, Result, RsaError, DEFAULT_ROUNDS};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding `public.key`, `private.key` and peer keys.
    pub key_dir: PathBuf,
    pub key_size: i64,
    pub rounds: u32,
    pub split: PrimeSplit,
    pub silent: bool,
}

lazy_static! {
    pub static ref CONFIG_DEF: Config = Config {
        key_dir: PathBuf::from("."),
        key_size: 1024,
        rounds: DEFAULT_ROUNDS,
        split: PrimeSplit::default(),
        silent: false,
    };
}

impl Default for Config {
    fn default() -> Self { CONFIG_DEF.clone() }
}

impl Config {
    pub fn prime_generator(&self) -> PrimeGenerator { PrimeGenerator::new(self.rounds) }

    pub fn key_pair_generator(&self) -> Result<KeyPairGenerator> {
        if self.rounds == 0 {
            return Err(RsaError::InvalidArgument("rounds must be at least 1".to_string()));
        }
        let split = PrimeSplit::new(self.split.min_fraction, self.split.max_fraction)?;
        Ok(KeyPairGenerator::new(self.prime_generator(), split))
    }

    pub fn key_store(&self) -> KeyStore { KeyStore::at_path(&self.key_dir) }
}
