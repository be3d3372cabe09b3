use super::payload::BlockData;
use serde::{Deserialize, Serialize};
use std::fmt;
use votechain_common::Timestamp;

/// Sentinel stored as the genesis block's parent reference on the wire
pub const GENESIS_PARENT: &str = "0";

/// Digest of a block, hex-encoded wherever it leaves the process
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, HashParseError> {
        let decoded =
            hex::decode(hex_str).map_err(|err| HashParseError::InvalidHex(err.to_string()))?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|bytes: Vec<u8>| HashParseError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Number of leading `'0'` characters in the hex encoding.
    ///
    /// One hex digit per nibble, so this walks half-bytes from the front.
    pub fn leading_zero_hex_digits(&self) -> u8 {
        let mut count = 0u8;

        for &byte in &self.0 {
            if byte == 0 {
                count += 2;
            } else if byte >> 4 == 0 {
                count += 1;
                break;
            } else {
                break;
            }
        }

        count
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for BlockHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Hash parsing errors
#[derive(Debug, thiserror::Error)]
pub enum HashParseError {
    #[error("invalid hash hex: {0}")]
    InvalidHex(String),

    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// One sealed (or about to be sealed) vote event and its position in the
/// chain.
///
/// Wire field names follow the persisted document layout; `previous_hash` is
/// the sentinel string `"0"` for genesis rather than a real digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the sequence; 0 is reserved for genesis
    pub index: u64,

    /// Creation instant in epoch milliseconds, informational only
    pub timestamp: Timestamp,

    /// The vote event (or the genesis note)
    pub data: BlockData,

    /// Digest of the prior block; `None` only for genesis
    #[serde(with = "parent_hash")]
    pub previous_hash: Option<BlockHash>,

    /// Digest over (index, previous_hash, timestamp, data, nonce)
    pub hash: BlockHash,

    /// Proof-of-work counter, 0 until mining begins
    pub nonce: u64,
}

impl Block {
    /// Create a new block with nonce 0 and its hash computed immediately
    pub fn new(
        index: u64,
        timestamp: Timestamp,
        data: BlockData,
        previous_hash: Option<BlockHash>,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            data,
            previous_hash,
            hash: BlockHash([0u8; 32]),
            nonce: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    /// The fixed first block establishing the chain's origin. Never mined.
    pub fn genesis(timestamp: Timestamp) -> Self {
        Self::new(0, timestamp, BlockData::genesis_note(), None)
    }

    /// Recompute this block's digest from its current fields.
    ///
    /// Pure and deterministic; chain validation relies on this reproducing
    /// the stored hash for untampered blocks.
    pub fn compute_hash(&self) -> BlockHash {
        let mut hasher = blake3::Hasher::new();

        hasher.update(&self.index.to_le_bytes());
        match &self.previous_hash {
            Some(parent) => hasher.update(parent.as_bytes()),
            None => hasher.update(GENESIS_PARENT.as_bytes()),
        };
        hasher.update(&self.timestamp.as_millis().to_le_bytes());
        self.data.digest_into(&mut hasher);
        hasher.update(&self.nonce.to_le_bytes());

        BlockHash(*hasher.finalize().as_bytes())
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Whether this block's hash starts with `difficulty` zero hex digits
    pub fn meets_difficulty(&self, difficulty: u8) -> bool {
        self.hash.leading_zero_hex_digits() >= difficulty
    }
}

/// Serde adapter for the parent reference: genesis persists the sentinel
/// `"0"`, every other block a hex digest.
mod parent_hash {
    use super::{BlockHash, GENESIS_PARENT};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<BlockHash>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(hash) => serializer.serialize_str(&hash.to_hex()),
            None => serializer.serialize_str(GENESIS_PARENT),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BlockHash>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == GENESIS_PARENT {
            return Ok(None);
        }
        BlockHash::from_hex(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::payload::VotePayload;
    use votechain_common::{CandidateId, VoterFingerprint, FINGERPRINT_LEN};

    fn vote(fingerprint_byte: u8, candidate: &str) -> BlockData {
        BlockData::Vote(VotePayload::new(
            VoterFingerprint::from_bytes([fingerprint_byte; FINGERPRINT_LEN]),
            CandidateId::new(candidate).unwrap(),
        ))
    }

    #[test]
    fn test_genesis_block_shape() {
        let genesis = Block::genesis(Timestamp::from_millis(1));

        assert_eq!(genesis.index, 0);
        assert!(genesis.previous_hash.is_none());
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.is_genesis());
        assert_eq!(genesis.hash, genesis.compute_hash());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block1 = Block::new(1, Timestamp::from_millis(5), vote(1, "A"), None);
        let block2 = Block::new(1, Timestamp::from_millis(5), vote(1, "A"), None);

        // Same content should produce same hash
        assert_eq!(block1.hash, block2.hash);
        assert_eq!(block1.compute_hash(), block1.compute_hash());

        // Different content should produce different hash
        let block3 = Block::new(2, Timestamp::from_millis(5), vote(1, "A"), None);
        assert_ne!(block1.hash, block3.hash);
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = Block::new(1, Timestamp::from_millis(5), vote(1, "A"), None);

        let mut changed = base.clone();
        changed.nonce = 7;
        assert_ne!(changed.compute_hash(), base.hash);

        let mut changed = base.clone();
        changed.timestamp = Timestamp::from_millis(6);
        assert_ne!(changed.compute_hash(), base.hash);

        let mut changed = base.clone();
        changed.previous_hash = Some(base.hash);
        assert_ne!(changed.compute_hash(), base.hash);

        let mut changed = base.clone();
        changed.data = vote(1, "B");
        assert_ne!(changed.compute_hash(), base.hash);
    }

    #[test]
    fn test_wire_format() {
        let genesis = Block::genesis(Timestamp::from_millis(42));
        let json = serde_json::to_value(&genesis).unwrap();

        assert_eq!(json["index"], 0);
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["previousHash"], "0");
        assert_eq!(json["nonce"], 0);
        assert_eq!(json["hash"], genesis.hash.to_hex());
        assert!(json["data"]["info"].is_string());
    }

    #[test]
    fn test_parent_hash_roundtrip() {
        let genesis = Block::genesis(Timestamp::from_millis(1));
        let child = Block::new(
            1,
            Timestamp::from_millis(2),
            vote(9, "A"),
            Some(genesis.hash),
        );

        let encoded = serde_json::to_string(&child).unwrap();
        let decoded: Block = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, child);
        assert_eq!(decoded.previous_hash, Some(genesis.hash));
    }

    #[test]
    fn test_leading_zero_hex_digits() {
        assert_eq!(
            BlockHash::from_bytes([0u8; 32]).leading_zero_hex_digits(),
            64
        );

        let mut bytes = [0xffu8; 32];
        assert_eq!(BlockHash::from_bytes(bytes).leading_zero_hex_digits(), 0);

        bytes[0] = 0x0f; // "0f..."
        assert_eq!(BlockHash::from_bytes(bytes).leading_zero_hex_digits(), 1);

        bytes[0] = 0x00; // "00ff..."
        assert_eq!(BlockHash::from_bytes(bytes).leading_zero_hex_digits(), 2);

        bytes[1] = 0x0f; // "000f..."
        assert_eq!(BlockHash::from_bytes(bytes).leading_zero_hex_digits(), 3);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let block = Block::genesis(Timestamp::from_millis(1));
        let parsed = BlockHash::from_hex(&block.hash.to_hex()).unwrap();
        assert_eq!(parsed, block.hash);

        assert!(matches!(
            BlockHash::from_hex("zz"),
            Err(HashParseError::InvalidHex(_))
        ));
        assert!(matches!(
            BlockHash::from_hex("abcd"),
            Err(HashParseError::InvalidLength(2))
        ));
    }
}
