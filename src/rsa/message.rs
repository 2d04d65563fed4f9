use serde::{Deserialize, Serialize};
use crate::rsa::keys::{KeyStore, StoreError, StoreResult};
use crate::rsa::{decrypt_text, encrypt_text};

/// Encrypted message addressed to `email`.
///
/// JSON shape: `{"email": "<recipient>", "content": "<base64 ciphertext>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub email: String,
    pub content: String,
}

impl Message {
    /// Encrypts `text` with the stored public key of `email`.
    pub fn seal(store: &KeyStore, email: &str, text: &str) -> StoreResult<Self> {
        let recipient = store.load_peer_key(email)?;
        let content = encrypt_text(text, recipient.key())?;
        Ok(Self { email: email.to_string(), content })
    }

    /// Decrypts with the local private key, which must be registered for
    /// the message's address.
    pub fn open(&self, store: &KeyStore) -> StoreResult<String> {
        let private = store.load_private()?;
        if !private.is_authorized(&self.email) {
            return Err(StoreError::NotAuthorized(self.email.clone()));
        }
        Ok(decrypt_text(&self.content, private.key())?)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;
    use crate::rsa::keys::{KeyStore, PrivateKeyRecord, PublicKeyRecord, StoreError};
    use crate::rsa::{KeyPairGenerator, RsaError};
    use super::Message;

    fn store_with_pair(dir: &std::path::Path) -> Result<KeyStore, Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(31);
        let (public, private) = KeyPairGenerator::default().generate_key_pair(512, &mut rng)?;
        let store = KeyStore::at_path(dir);
        store.save_key_pair(&PublicKeyRecord::new(public), &PrivateKeyRecord::new(private))?;
        Ok(store)
    }

    #[test]
    fn test_seal_and_open() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let store = store_with_pair(dir.path())?;
        let published = store.register("alice@example.com")?;
        // alice's own key, as a peer would have fetched it
        store.save_peer_key(&published)?;

        let message = Message::seal(&store, "alice@example.com", "hello")?;
        assert_eq!(message.email, "alice@example.com");
        let json = serde_json::to_string(&message)?;
        let parsed: Message = serde_json::from_str(&json)?;
        assert_eq!(parsed.open(&store)?, "hello");
        Ok(())
    }

    #[test]
    fn test_open_unregistered_address() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let store = store_with_pair(dir.path())?;
        let published = store.load_public()?.with_email("bob@example.com");
        store.save_peer_key(&published)?;
        let message = Message::seal(&store, "bob@example.com", "hi bob")?;
        assert!(matches!(message.open(&store), Err(StoreError::NotAuthorized(_))));
        store.register("bob@example.com")?;
        assert_eq!(message.open(&store)?, "hi bob");
        Ok(())
    }

    #[test]
    fn test_seal_without_peer_key() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let store = store_with_pair(dir.path())?;
        assert!(matches!(Message::seal(&store, "carol@example.com", "hi"), Err(StoreError::KeyNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_tampered_content() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let store = store_with_pair(dir.path())?;
        store.register("alice@example.com")?;
        let message = Message { email: "alice@example.com".to_string(), content: "!!".to_string() };
        assert!(matches!(message.open(&store), Err(StoreError::Rsa(RsaError::CryptoFailure(_)))));
        Ok(())
    }
}
