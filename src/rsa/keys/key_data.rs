use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::rsa::keys::Key;

/// Public key as stored on disk and exchanged with peers.
///
/// JSON shape: `{"email": "<owner or empty>", "key": "<base64>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    #[serde(default)]
    email: String,
    key: String,
}

impl PublicKeyRecord {
    /// Freshly generated record, not yet associated with anyone.
    pub fn new(key: String) -> Self {
        Self { email: String::new(), key }
    }

    /// Same key, stamped with its owner's address.
    pub fn with_email(self, email: impl Into<String>) -> Self {
        Self { email: email.into(), ..self }
    }

    pub fn owner_email(&self) -> Option<&str> {
        match self.email.as_str() {
            "" => None,
            email => Some(email),
        }
    }

    pub fn key(&self) -> &str { &self.key }

    pub fn decode(&self) -> crate::rsa::Result<Key> { Key::decode(&self.key) }
}

/// Private key plus the addresses it is allowed to receive mail for.
///
/// JSON shape: `{"email": ["<address>", ...], "key": "<base64>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyRecord {
    #[serde(default)]
    email: BTreeSet<String>,
    key: String,
}

impl PrivateKeyRecord {
    pub fn new(key: String) -> Self {
        Self { email: BTreeSet::new(), key }
    }

    pub fn authorized_emails(&self) -> impl Iterator<Item = &str> {
        self.email.iter().map(String::as_str)
    }

    pub fn is_authorized(&self, email: &str) -> bool { self.email.contains(email) }

    /// Adds `email`; returns `false` if it was already present. Addresses
    /// are never removed.
    pub fn authorize(&mut self, email: impl Into<String>) -> bool {
        self.email.insert(email.into())
    }

    pub fn key(&self) -> &str { &self.key }

    pub fn decode(&self) -> crate::rsa::Result<Key> { Key::decode(&self.key) }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use super::{PrivateKeyRecord, PublicKeyRecord};

    #[test]
    fn test_public_json() -> Result<(), Box<dyn Error>> {
        let record = PublicKeyRecord::new("AAAA".to_string());
        assert_eq!(record.owner_email(), None);
        assert_eq!(serde_json::to_string(&record)?, r#"{"email":"","key":"AAAA"}"#);
        let record = record.with_email("alice@example.com");
        assert_eq!(record.owner_email(), Some("alice@example.com"));
        let parsed: PublicKeyRecord = serde_json::from_str(r#"{"email":"alice@example.com","key":"AAAA"}"#)?;
        assert_eq!(parsed, record);
        let no_email: PublicKeyRecord = serde_json::from_str(r#"{"key":"AAAA"}"#)?;
        assert_eq!(no_email.owner_email(), None);
        Ok(())
    }

    #[test]
    fn test_private_json() -> Result<(), Box<dyn Error>> {
        let mut record = PrivateKeyRecord::new("BBBB".to_string());
        assert_eq!(serde_json::to_string(&record)?, r#"{"email":[],"key":"BBBB"}"#);
        assert!(record.authorize("bob@example.com"));
        assert!(record.authorize("alice@example.com"));
        assert!(!record.authorize("bob@example.com"));
        assert!(record.is_authorized("alice@example.com"));
        assert!(!record.is_authorized("eve@example.com"));
        let json = serde_json::to_string(&record)?;
        assert_eq!(json, r#"{"email":["alice@example.com","bob@example.com"],"key":"BBBB"}"#);
        let parsed: PrivateKeyRecord = serde_json::from_str(&json)?;
        assert_eq!(parsed.authorized_emails().collect::<Vec<_>>(), vec!["alice@example.com", "bob@example.com"]);
        Ok(())
    }
}
