use crate::gateway::LockAttestation;
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode attestation: {0}")]
    EncodeError(String),

    #[error("Failed to decode attestation: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Codec for attestations crossing process boundaries
pub struct AttestationCodec;

impl AttestationCodec {
    /// Encode to compact binary bytes
    pub fn encode(attestation: &LockAttestation) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(attestation).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    /// Decode from binary bytes
    pub fn decode(bytes: &[u8]) -> Result<LockAttestation, CodecError> {
        postcard::from_bytes(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    /// Encode to hex string
    pub fn encode_hex(attestation: &LockAttestation) -> Result<String, CodecError> {
        Ok(hex::encode(Self::encode(attestation)?))
    }

    /// Decode from hex string
    pub fn decode_hex(hex_str: &str) -> Result<LockAttestation, CodecError> {
        let bytes = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Encode to base64 string (URL-safe, no padding)
    pub fn encode_base64(attestation: &LockAttestation) -> Result<String, CodecError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        Ok(URL_SAFE_NO_PAD.encode(Self::encode(attestation)?))
    }

    /// Decode from base64 string
    pub fn decode_base64(b64_str: &str) -> Result<LockAttestation, CodecError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}
