//! Textbook RSA: key pair generation, a compact Base64 key format and
//! single-block encryption of short messages, plus JSON key records for
//! storing keys on disk.
//!
//! ```no_run
//! use rsa_messenger::{decrypt_text, encrypt_text, generate_key_pair};
//!
//! let (public, private) = generate_key_pair(512)?;
//! let cipher = encrypt_text("hello", &public)?;
//! assert_eq!(decrypt_text(&cipher, &private)?, "hello");
//! # Ok::<(), rsa_messenger::RsaError>(())
//! ```
//!
//! No padding is applied. Do not use this to protect anything real.

pub mod rsa;

pub use crate::rsa::*;
