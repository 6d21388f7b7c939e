use crate::identity::PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Domain prefix for token namespace derivation
const TOKEN_ID_PREFIX: &[u8] = b"lockmint:token:";

#[derive(Error, Debug)]
pub enum TokenIdError {
    #[error("invalid token id length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// A token namespace identifier
///
/// `TokenId::BASE` names the base currency namespace every plain account
/// lives in. A derived namespace is owned by exactly one account: the one
/// whose public key hashes to it. Derivation is deterministic, so namespace
/// ownership is checked by re-deriving rather than by lookup.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId([u8; 32]);

impl TokenId {
    /// The base currency namespace
    pub const BASE: TokenId = TokenId([0u8; 32]);

    /// Derive the token namespace owned by the given account
    pub fn derive(owner: &PublicKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(TOKEN_ID_PREFIX);
        hasher.update(owner.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    pub fn is_base(&self) -> bool {
        *self == Self::BASE
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TokenIdError> {
        if bytes.len() != 32 {
            return Err(TokenIdError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, TokenIdError> {
        let bytes = hex::decode(s).map_err(|e| TokenIdError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_base() {
            write!(f, "base")
        } else {
            write!(f, "{}", &self.to_hex()[..16])
        }
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.to_hex())
    }
}

impl Serialize for TokenId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TokenIdVisitor;

        impl<'de> serde::de::Visitor<'de> for TokenIdVisitor {
            type Value = TokenId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("32 bytes of token id")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                TokenId::from_bytes(v).map_err(serde::de::Error::custom)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(32);
                while let Some(byte) = seq.next_element()? {
                    bytes.push(byte);
                }
                TokenId::from_bytes(&bytes).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(TokenIdVisitor)
    }
}
