//! Directory-backed key store.
//!
//! Own keys live in `public.key` / `private.key`, keys received from peers
//! in `<email>.key`. Every file holds one JSON key record.

use std::io;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use crate::rsa::keys::{PrivateKeyRecord, PublicKeyRecord};
use crate::rsa::RsaError;

pub const PUBLIC_KEY_FILE: &str = "public.key";
pub const PRIVATE_KEY_FILE: &str = "private.key";
const PEER_KEY_EXTENSION: &str = "key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid key record in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("key not found: {0}")]
    KeyNotFound(PathBuf),

    #[error("private key is not authorized for {0}")]
    NotAuthorized(String),

    #[error(transparent)]
    Rsa(#[from] RsaError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn at_path(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn public_path(&self) -> PathBuf { self.dir.join(PUBLIC_KEY_FILE) }

    pub fn private_path(&self) -> PathBuf { self.dir.join(PRIVATE_KEY_FILE) }

    pub fn peer_path(&self, email: &str) -> StoreResult<PathBuf> {
        let bad = email.is_empty()
            || email.starts_with('.')
            || email.chars().any(|c| c == '/' || c == '\\' || c.is_control());
        if bad {
            return Err(RsaError::InvalidArgument(format!("{:?} cannot name a key file", email)).into());
        }
        let file = format!("{}.{}", email, PEER_KEY_EXTENSION);
        // own key files are off limits, in any case
        if file.eq_ignore_ascii_case(PUBLIC_KEY_FILE) || file.eq_ignore_ascii_case(PRIVATE_KEY_FILE) {
            return Err(RsaError::InvalidArgument(format!("{:?} is reserved for the local key pair", email)).into());
        }
        Ok(self.dir.join(file))
    }

    pub fn save_key_pair(&self, public: &PublicKeyRecord, private: &PrivateKeyRecord) -> StoreResult<()> {
        self.write(&self.public_path(), public)?;
        self.write(&self.private_path(), private)
    }

    pub fn load_public(&self) -> StoreResult<PublicKeyRecord> { self.read(&self.public_path()) }

    pub fn load_private(&self) -> StoreResult<PrivateKeyRecord> { self.read(&self.private_path()) }

    /// Stores a peer's public key under its owner's address.
    pub fn save_peer_key(&self, record: &PublicKeyRecord) -> StoreResult<PathBuf> {
        let email = record.owner_email().ok_or_else(|| {
            RsaError::InvalidArgument("peer key record carries no email".to_string())
        })?;
        record.decode()?;
        let path = self.peer_path(email)?;
        self.write(&path, record)?;
        Ok(path)
    }

    pub fn load_peer_key(&self, email: &str) -> StoreResult<PublicKeyRecord> {
        self.read(&self.peer_path(email)?)
    }

    /// Makes `email` a valid recipient address for the local key pair.
    ///
    /// The private record gains the address and is written back; the public
    /// record is returned stamped with the address, ready to be published.
    pub fn register(&self, email: &str) -> StoreResult<PublicKeyRecord> {
        self.peer_path(email)?;
        let public = self.load_public()?;
        let mut private = self.load_private()?;
        if private.authorize(email) {
            self.write(&self.private_path(), &private)?;
        }
        Ok(public.with_email(email))
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<T> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::KeyNotFound(path.to_path_buf()));
            }
            Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
        };
        serde_json::from_str(&content)
            .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> StoreResult<()> {
        let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let content = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
        // write to `<file>.tmp` first, then rename
        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);
        std::fs::write(&temp_path, content).map_err(io_err)?;
        std::fs::rename(&temp_path, path).map_err(io_err)?;
        Ok(())
    }
}
