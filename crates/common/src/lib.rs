use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub mod config;

pub use config::{ConfigError, LedgerConfig};

pub const FINGERPRINT_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid fingerprint length: expected {expected} bytes, got {actual}")]
    InvalidFingerprint { expected: usize, actual: usize },
    #[error("invalid fingerprint hex: {0}")]
    InvalidFingerprintHex(String),
    #[error("candidate id must not be empty")]
    EmptyCandidateId,
}

/// One-way digest standing in for a voter's identity.
///
/// The submission collaborator derives this from the voter's identity before
/// it reaches the ledger; the raw identity is never seen or stored here.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoterFingerprint([u8; FINGERPRINT_LEN]);

impl VoterFingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DomainError> {
        if bytes.len() != FINGERPRINT_LEN {
            return Err(DomainError::InvalidFingerprint {
                expected: FINGERPRINT_LEN,
                actual: bytes.len(),
            });
        }

        let mut array = [0u8; FINGERPRINT_LEN];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, DomainError> {
        let decoded = hex::decode(hex_str)
            .map_err(|err| DomainError::InvalidFingerprintHex(err.to_string()))?;
        Self::from_slice(&decoded)
    }
}

impl fmt::Debug for VoterFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoterFingerprint({})", hex::encode(self.0))
    }
}

impl fmt::Display for VoterFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; FINGERPRINT_LEN]> for VoterFingerprint {
    fn from(value: [u8; FINGERPRINT_LEN]) -> Self {
        Self::from_bytes(value)
    }
}

impl FromStr for VoterFingerprint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for VoterFingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VoterFingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a candidate as announced by the election administrators.
///
/// Opaque to the ledger; it is only compared and counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyCandidateId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CandidateId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Timestamp in Unix epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System time before Unix epoch");
        Self(duration.as_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_rejects_wrong_length() {
        let err = VoterFingerprint::from_slice(&[1u8; 16]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFingerprint { .. }));
    }

    #[test]
    fn fingerprint_parses_hex_roundtrip() {
        let hex_id = "ab".repeat(FINGERPRINT_LEN);
        let parsed = VoterFingerprint::from_hex(&hex_id).expect("should parse valid hex");
        assert_eq!(parsed.to_string(), hex_id);
    }

    #[test]
    fn fingerprint_rejects_bad_hex() {
        let err = VoterFingerprint::from_hex("not-hex").unwrap_err();
        assert!(matches!(err, DomainError::InvalidFingerprintHex(_)));
    }

    #[test]
    fn fingerprint_serializes_as_hex_string() {
        let fingerprint = VoterFingerprint::from_bytes([0xab; FINGERPRINT_LEN]);
        let encoded = serde_json::to_string(&fingerprint).unwrap();
        assert_eq!(encoded, format!("\"{}\"", "ab".repeat(FINGERPRINT_LEN)));

        let decoded: VoterFingerprint = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, fingerprint);
    }

    #[test]
    fn candidate_id_rejects_empty() {
        assert_eq!(CandidateId::new(""), Err(DomainError::EmptyCandidateId));
    }

    #[test]
    fn timestamp_millis_roundtrip() {
        let ts = Timestamp::from_millis(1_700_000_000_000);
        assert_eq!(ts.as_millis(), 1_700_000_000_000);
        let encoded = serde_json::to_string(&ts).unwrap();
        assert_eq!(encoded, "1700000000000");
    }
}
