use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use rsa_messenger::config::{Config, CONFIG_DEF};
use rsa_messenger::{decrypt, encrypt, Message, PrimeSplit, PrivateKeyRecord, PublicKeyRecord};

#[derive(Debug, Parser)]
#[clap(version, about = "Textbook RSA key generation and message encryption")]
pub struct Cli {
    #[clap(short, long, value_parser, default_value_os_t = CONFIG_DEF.key_dir.clone(), help = "Directory holding the key files")]
    pub dir: PathBuf,
    #[clap(short, long, value_parser = clap::value_parser!(u32).range(1..), default_value_t = CONFIG_DEF.rounds, help = "Miller Rabin calculate rounds")]
    pub rounds: u32,
    #[clap(long, value_parser, default_value_t = CONFIG_DEF.split.min_fraction, help = "Smallest share of the key size moved between the two primes")]
    pub split_min: f64,
    #[clap(long, value_parser, default_value_t = CONFIG_DEF.split.max_fraction, help = "Largest share of the key size moved between the two primes")]
    pub split_max: f64,
    #[clap(short, long, value_parser, default_value_t = CONFIG_DEF.silent, help = "Disable log output")]
    pub silent: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a key pair into public.key / private.key
    Keygen {
        #[clap(value_parser, allow_hyphen_values = true, default_value_t = CONFIG_DEF.key_size)]
        bits: i64,
    },
    /// Print the public key record, optionally stamped with an address
    Export {
        #[clap(value_parser)]
        email: Option<String>,
    },
    /// Store a peer's public key record as <email>.key
    Import {
        #[clap(value_parser)]
        file: PathBuf,
    },
    /// Accept mail for an address and print the public record to publish
    Register {
        #[clap(value_parser)]
        email: String,
    },
    /// Encrypt a text for a peer and print the message record
    Encrypt {
        #[clap(value_parser)]
        email: String,
        #[clap(value_parser)]
        text: String,
    },
    /// Decrypt a message record file with the local private key
    Decrypt {
        #[clap(value_parser)]
        file: PathBuf,
    },
    /// Round-trip random data through the local key pair
    Test,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            key_dir: self.dir.clone(),
            key_size: CONFIG_DEF.key_size,
            rounds: self.rounds,
            split: PrimeSplit { min_fraction: self.split_min, max_fraction: self.split_max },
            silent: self.silent,
        }
    }

    pub fn run(&self) -> Result<(), Box<dyn Error>> {
        let config = self.config();
        let store = config.key_store();
        match &self.command {
            Command::Keygen { bits } => {
                let generator = config.key_pair_generator()?;
                let pb = match config.silent {
                    true => None,
                    false => Some(ProgressBar::new_spinner()),
                };
                if let Some(pb) = &pb {
                    pb.set_style(ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")?);
                    pb.set_message(format!("searching primes for a {}-bit key", bits));
                    pb.enable_steady_tick(Duration::from_millis(100));
                }
                let start = Local::now().timestamp_millis();
                let result = generator.generate_key_pair(*bits, &mut OsRng);
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                let (public, private) = result?;
                let time = Local::now().timestamp_millis() - start;
                store.save_key_pair(&PublicKeyRecord::new(public), &PrivateKeyRecord::new(private))?;
                info!(bits, time_ms = time, dir = %store.dir().display(), "generated key pair");
            }
            Command::Export { email } => {
                let mut public = store.load_public()?;
                if let Some(email) = email {
                    public = public.with_email(email.as_str());
                }
                println!("{}", serde_json::to_string_pretty(&public)?);
            }
            Command::Import { file } => {
                let record: PublicKeyRecord = serde_json::from_str(&fs::read_to_string(file)?)?;
                let path = store.save_peer_key(&record)?;
                info!(path = %path.display(), "stored peer key");
            }
            Command::Register { email } => {
                let public = store.register(email)?;
                info!(%email, "registered address");
                println!("{}", serde_json::to_string_pretty(&public)?);
            }
            Command::Encrypt { email, text } => {
                let message = Message::seal(&store, email, text)?;
                println!("{}", serde_json::to_string_pretty(&message)?);
            }
            Command::Decrypt { file } => {
                let message: Message = serde_json::from_str(&fs::read_to_string(file)?)?;
                println!("{}", message.open(&store)?);
            }
            Command::Test => self.self_test(&store)?,
        }
        Ok(())
    }

    fn self_test(&self, store: &rsa_messenger::KeyStore) -> Result<(), Box<dyn Error>> {
        let public = store.load_public()?;
        let private = store.load_private()?;
        let (public_key, private_key) = (public.decode()?, private.decode()?);
        if public_key.modulus() != private_key.modulus() {
            return Err("public and private keys do not share a modulus".into());
        }
        let block = (public_key.modulus().bits() as usize).saturating_sub(1) / 8;
        if block == 0 {
            return Err("modulus too small to carry a byte".into());
        }
        info!(modulus_bits = public_key.modulus().bits(), block, "start testing key pair");
        let rounds = 64;
        let mut source = vec![0u8; block];
        for i in 0..rounds {
            OsRng.try_fill_bytes(&mut source)?;
            source[0] |= 1;
            let cipher = encrypt(&source, public.key())?;
            let plain = decrypt(&cipher, private.key())?;
            if plain != source {
                return Err(format!("round {} mismatch for {}", i, BigUint::from_bytes_be(&source)).into());
            }
            debug!(round = i, "round trip ok");
        }
        info!(rounds, "test pass");
        Ok(())
    }
}

fn init_logging(silent: bool) {
    let filter = match silent {
        true => EnvFilter::new("off"),
        false => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rsa_messenger=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.silent);
    debug!(?cli, "run args");
    cli.run()
}
