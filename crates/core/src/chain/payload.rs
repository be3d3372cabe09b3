use serde::{Deserialize, Serialize};
use votechain_common::{CandidateId, VoterFingerprint};

/// Payload of a single vote event.
///
/// Carries the privacy-preserving identity fingerprint and the chosen
/// candidate. `faculty` and `iso_timestamp` travel with the vote for display
/// purposes but are never interpreted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    /// One-way digest of the voter's identity
    pub identity_fingerprint: VoterFingerprint,

    /// Candidate receiving the vote
    pub candidate_id: CandidateId,

    /// Voter's faculty, carried but not interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,

    /// Human-readable submission time, carried but not interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_timestamp: Option<String>,
}

impl VotePayload {
    pub fn new(identity_fingerprint: VoterFingerprint, candidate_id: CandidateId) -> Self {
        Self {
            identity_fingerprint,
            candidate_id,
            faculty: None,
            iso_timestamp: None,
        }
    }

    pub fn with_faculty(mut self, faculty: impl Into<String>) -> Self {
        self.faculty = Some(faculty.into());
        self
    }

    pub fn with_iso_timestamp(mut self, iso_timestamp: impl Into<String>) -> Self {
        self.iso_timestamp = Some(iso_timestamp.into());
        self
    }
}

/// Record stored inside a block.
///
/// Votes make up the chain body; the `Note` form exists for the genesis
/// block, which carries a fixed informational sentinel instead of a vote.
/// Untagged so the wire format stays a plain object, matching the persisted
/// document layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockData {
    Vote(VotePayload),
    Note { info: String },
}

impl BlockData {
    /// The fixed sentinel payload of the genesis block
    pub fn genesis_note() -> Self {
        Self::Note {
            info: "VoteChain genesis block".to_string(),
        }
    }

    /// Candidate this record votes for, if it is a vote at all.
    ///
    /// Tally and duplicate scans skip records that answer `None` here rather
    /// than failing the whole scan.
    pub fn candidate(&self) -> Option<&CandidateId> {
        match self {
            Self::Vote(payload) => Some(&payload.candidate_id),
            Self::Note { .. } => None,
        }
    }

    /// Fingerprint of the voter behind this record, if it is a vote
    pub fn fingerprint(&self) -> Option<&VoterFingerprint> {
        match self {
            Self::Vote(payload) => Some(&payload.identity_fingerprint),
            Self::Note { .. } => None,
        }
    }

    /// Feed this record into a block digest.
    ///
    /// Variable-length fields are length-prefixed so distinct payloads can
    /// never produce the same byte stream.
    pub(crate) fn digest_into(&self, hasher: &mut blake3::Hasher) {
        fn update_str(hasher: &mut blake3::Hasher, value: &str) {
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }

        fn update_opt(hasher: &mut blake3::Hasher, value: Option<&str>) {
            match value {
                Some(value) => {
                    hasher.update(&[1]);
                    update_str(hasher, value);
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }

        match self {
            Self::Vote(payload) => {
                hasher.update(&[1]);
                hasher.update(payload.identity_fingerprint.as_bytes());
                update_str(hasher, payload.candidate_id.as_str());
                update_opt(hasher, payload.faculty.as_deref());
                update_opt(hasher, payload.iso_timestamp.as_deref());
            }
            Self::Note { info } => {
                hasher.update(&[0]);
                update_str(hasher, info);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use votechain_common::FINGERPRINT_LEN;

    fn fingerprint(byte: u8) -> VoterFingerprint {
        VoterFingerprint::from_bytes([byte; FINGERPRINT_LEN])
    }

    fn candidate(id: &str) -> CandidateId {
        CandidateId::new(id).unwrap()
    }

    #[test]
    fn test_vote_payload_wire_names() {
        let payload = VotePayload::new(fingerprint(1), candidate("A"))
            .with_faculty("Engineering")
            .with_iso_timestamp("2026-01-01T00:00:00Z");

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("identityFingerprint").is_some());
        assert!(json.get("candidateId").is_some());
        assert!(json.get("faculty").is_some());
        assert!(json.get("isoTimestamp").is_some());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let payload = VotePayload::new(fingerprint(1), candidate("A"));
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("faculty").is_none());
        assert!(json.get("isoTimestamp").is_none());
    }

    #[test]
    fn test_untagged_roundtrip() {
        let vote = BlockData::Vote(VotePayload::new(fingerprint(2), candidate("B")));
        let encoded = serde_json::to_string(&vote).unwrap();
        let decoded: BlockData = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, vote);

        let note = BlockData::genesis_note();
        let encoded = serde_json::to_string(&note).unwrap();
        let decoded: BlockData = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, note);
    }

    #[test]
    fn test_note_carries_no_candidate() {
        let note = BlockData::genesis_note();
        assert!(note.candidate().is_none());
        assert!(note.fingerprint().is_none());

        let vote = BlockData::Vote(VotePayload::new(fingerprint(3), candidate("C")));
        assert_eq!(vote.candidate(), Some(&candidate("C")));
        assert_eq!(vote.fingerprint(), Some(&fingerprint(3)));
    }

    #[test]
    fn test_digest_distinguishes_field_boundaries() {
        // "ab" + "c" and "a" + "bc" must not collide in the digest
        let left = BlockData::Vote(
            VotePayload::new(fingerprint(4), candidate("ab")).with_faculty("c"),
        );
        let right = BlockData::Vote(
            VotePayload::new(fingerprint(4), candidate("a")).with_faculty("bc"),
        );

        let mut left_hasher = blake3::Hasher::new();
        left.digest_into(&mut left_hasher);
        let mut right_hasher = blake3::Hasher::new();
        right.digest_into(&mut right_hasher);

        assert_ne!(left_hasher.finalize(), right_hasher.finalize());
    }
}
