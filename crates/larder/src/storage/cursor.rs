//! Account-bound continuation cursors.
//!
//! Wraps the store's native last-evaluated key in an opaque, URL-safe token.
//! The symmetric key is derived from the account id, so a token minted for
//! one account fails authentication under any other; tampering and
//! cross-account replay surface as errors rather than degrading to an empty
//! or first-page cursor.
//!
//! Wire format: URL-safe base64 of JSON `{"nonce": hex, "ciphertext": hex}`.
//! The plaintext is a JSON map of attribute name to a one-entry
//! `{"S"|"N"|"B": value}` map, preserving the native key's mixed attribute
//! types.

use std::collections::BTreeMap;

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, KeyInit, Nonce};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use larder_core::storage::RepositoryError;

use super::store::Key;

const NONCE_LEN: usize = 12;

/// Errors surfaced while encoding or decoding a continuation token.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("malformed continuation token: {0}")]
    Malformed(String),
    #[error("continuation token failed authentication")]
    Authentication,
    #[error("continuation token could not be serialized: {0}")]
    Serialization(String),
}

impl From<CursorError> for RepositoryError {
    fn from(err: CursorError) -> Self {
        RepositoryError::InvalidInput(err.to_string())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    nonce: String,
    ciphertext: String,
}

fn account_cipher(account_id: &str) -> Result<Aes256Gcm, CursorError> {
    // The key is a one-way hash of the account id; the plaintext id never
    // feeds the cipher directly.
    let digest = Sha256::digest(account_id.as_bytes());
    Aes256Gcm::new_from_slice(&digest).map_err(|_| CursorError::Authentication)
}

fn serialize_key(last_key: &Key) -> Result<Vec<u8>, CursorError> {
    let mut tagged = BTreeMap::new();
    for (field, value) in last_key {
        let mut entry = BTreeMap::new();
        match value {
            AttributeValue::S(text) => {
                entry.insert("S".to_string(), text.clone());
            }
            AttributeValue::N(number) => {
                entry.insert("N".to_string(), number.clone());
            }
            AttributeValue::B(blob) => {
                entry.insert("B".to_string(), URL_SAFE.encode(blob.as_ref()));
            }
            other => {
                return Err(CursorError::Serialization(format!(
                    "unsupported key attribute: {other:?}"
                )));
            }
        }
        tagged.insert(field.clone(), entry);
    }
    serde_json::to_vec(&tagged).map_err(|err| CursorError::Serialization(err.to_string()))
}

fn deserialize_key(plaintext: &[u8]) -> Result<Key, CursorError> {
    let tagged: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_slice(plaintext)
        .map_err(|err| CursorError::Malformed(err.to_string()))?;
    let mut key = Key::with_capacity(tagged.len());
    for (field, entry) in tagged {
        let (tag, value) = entry
            .into_iter()
            .next()
            .ok_or_else(|| CursorError::Malformed(format!("empty tag for {field}")))?;
        let attr = match tag.as_str() {
            "S" => AttributeValue::S(value),
            "N" => AttributeValue::N(value),
            "B" => AttributeValue::B(Blob::new(
                URL_SAFE
                    .decode(value)
                    .map_err(|err| CursorError::Malformed(err.to_string()))?,
            )),
            other => {
                return Err(CursorError::Malformed(format!(
                    "unknown attribute tag: {other}"
                )));
            }
        };
        key.insert(field, attr);
    }
    Ok(key)
}

/// Encrypt the store's native continuation key into an opaque token.
///
/// An absent or empty key returns `None` without touching cryptography;
/// callers treat that as "no continuation available", not an error.
pub fn marshal(account_id: &str, last_key: Option<&Key>) -> Result<Option<String>, CursorError> {
    let last_key = match last_key {
        Some(key) if !key.is_empty() => key,
        _ => return Ok(None),
    };
    let serialized = serialize_key(last_key)?;
    let cipher = account_cipher(account_id)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, serialized.as_slice())
        .map_err(|_| CursorError::Serialization("encryption failed".to_string()))?;
    let envelope = Envelope {
        nonce: hex::encode(nonce),
        ciphertext: hex::encode(ciphertext),
    };
    let payload = serde_json::to_vec(&envelope)
        .map_err(|err| CursorError::Serialization(err.to_string()))?;
    Ok(Some(URL_SAFE.encode(payload)))
}

/// Decrypt a token minted by [`marshal`] back into the native key.
///
/// An absent or empty token returns `None`. Every decode or authentication
/// failure (wrong account, tampering, bad nonce) is an error.
pub fn unmarshal(account_id: &str, token: Option<&str>) -> Result<Option<Key>, CursorError> {
    let token = match token {
        Some(token) if !token.trim().is_empty() => token.trim(),
        _ => return Ok(None),
    };
    let payload = URL_SAFE
        .decode(token)
        .map_err(|err| CursorError::Malformed(err.to_string()))?;
    let envelope: Envelope = serde_json::from_slice(&payload)
        .map_err(|err| CursorError::Malformed(err.to_string()))?;
    let nonce_bytes =
        hex::decode(&envelope.nonce).map_err(|err| CursorError::Malformed(err.to_string()))?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(CursorError::Malformed(format!(
            "nonce must be {NONCE_LEN} bytes"
        )));
    }
    let ciphertext =
        hex::decode(&envelope.ciphertext).map_err(|err| CursorError::Malformed(err.to_string()))?;
    let cipher = account_cipher(account_id)?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_slice())
        .map_err(|_| CursorError::Authentication)?;
    deserialize_key(&plaintext).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::{ATTR_PARTITION, ATTR_SORT};

    fn sample_key() -> Key {
        let mut key = Key::new();
        key.insert(
            ATTR_PARTITION.to_string(),
            AttributeValue::S("012345678912:Recipe".to_string()),
        );
        key.insert(
            ATTR_SORT.to_string(),
            AttributeValue::S("item-1".to_string()),
        );
        key.insert("position".to_string(), AttributeValue::N("42".to_string()));
        key.insert(
            "digest".to_string(),
            AttributeValue::B(Blob::new(vec![0xde, 0xad, 0xbe, 0xef])),
        );
        key
    }

    #[test]
    fn test_round_trip_same_account() {
        let key = sample_key();
        let token = marshal("012345678912", Some(&key)).unwrap().unwrap();
        let back = unmarshal("012345678912", Some(&token)).unwrap().unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_cross_account_fails_authentication() {
        let key = sample_key();
        let token = marshal("account-a", Some(&key)).unwrap().unwrap();
        let err = unmarshal("account-b", Some(&token)).unwrap_err();
        assert!(matches!(err, CursorError::Authentication));
    }

    #[test]
    fn test_empty_key_is_no_token() {
        assert!(marshal("account-a", None).unwrap().is_none());
        assert!(marshal("account-a", Some(&Key::new())).unwrap().is_none());
        assert!(unmarshal("account-a", None).unwrap().is_none());
        assert!(unmarshal("account-a", Some("")).unwrap().is_none());
    }

    #[test]
    fn test_tampered_token_fails() {
        let key = sample_key();
        let token = marshal("account-a", Some(&key)).unwrap().unwrap();
        // Re-encode a corrupted ciphertext under the same envelope shape.
        let payload = URL_SAFE.decode(&token).unwrap();
        let mut envelope: Envelope = serde_json::from_slice(&payload).unwrap();
        let mut raw = hex::decode(&envelope.ciphertext).unwrap();
        raw[0] ^= 0xff;
        envelope.ciphertext = hex::encode(raw);
        let tampered = URL_SAFE.encode(serde_json::to_vec(&envelope).unwrap());
        let err = unmarshal("account-a", Some(&tampered)).unwrap_err();
        assert!(matches!(err, CursorError::Authentication));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let err = unmarshal("account-a", Some("not base64 at all!")).unwrap_err();
        assert!(matches!(err, CursorError::Malformed(_)));
    }

    #[test]
    fn test_fresh_nonce_per_token() {
        let key = sample_key();
        let first = marshal("account-a", Some(&key)).unwrap().unwrap();
        let second = marshal("account-a", Some(&key)).unwrap().unwrap();
        assert_ne!(first, second);
    }
}
