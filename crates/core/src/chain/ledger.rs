use super::block::Block;
use super::miner::{self, CancelToken, MiningAborted};
use super::payload::{BlockData, VotePayload};
use std::collections::HashMap;
use votechain_common::{CandidateId, Timestamp, VoterFingerprint};

/// The append-only vote ledger.
///
/// Owns the ordered block sequence exclusively; the only mutation is
/// appending a freshly mined block, and there is no delete or rollback in the
/// public API. `difficulty` is fixed for the chain's lifetime.
#[derive(Debug, Clone)]
pub struct VoteChain {
    blocks: Vec<Block>,
    difficulty: u8,
}

impl VoteChain {
    /// Create a fresh chain holding only the genesis block
    pub fn new(difficulty: u8) -> Self {
        Self {
            blocks: vec![Block::genesis(Timestamp::now())],
            difficulty,
        }
    }

    /// Rebuild a chain from already-sealed blocks.
    ///
    /// Callers (the codec) guarantee `blocks` is non-empty. No integrity
    /// checking happens here; that is an explicit separate step.
    pub(crate) fn from_blocks(blocks: Vec<Block>, difficulty: u8) -> Self {
        debug_assert!(!blocks.is_empty());
        Self { blocks, difficulty }
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        false // a chain always holds at least the genesis block
    }

    /// All blocks in sequence order, for admin inspection and persistence
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The most recently appended block
    pub fn latest(&self) -> &Block {
        self.blocks
            .last()
            .expect("a vote chain always holds at least the genesis block")
    }

    /// Build the unmined successor of the current tip for `payload`
    pub fn stage(&self, payload: VotePayload, timestamp: Timestamp) -> Block {
        Block::new(
            self.blocks.len() as u64,
            timestamp,
            BlockData::Vote(payload),
            Some(self.latest().hash),
        )
    }

    /// Attach a sealed block to the chain.
    ///
    /// Rejects blocks staged against anything other than the current tip, so
    /// two appends racing from the same snapshot cannot both land: the loser
    /// must restage against the new tip. Also rejects unsealed work.
    pub fn commit(&mut self, block: Block) -> Result<&Block, ChainError> {
        let expected_index = self.blocks.len() as u64;
        if block.index != expected_index {
            return Err(ChainError::IndexGap {
                expected: expected_index,
                got: block.index,
            });
        }

        if block.previous_hash.as_ref() != Some(&self.latest().hash) {
            return Err(ChainError::StaleParent { index: block.index });
        }

        if block.hash != block.compute_hash() {
            return Err(ChainError::InvalidSeal { index: block.index });
        }

        if !block.meets_difficulty(self.difficulty) {
            return Err(ChainError::InsufficientWork {
                index: block.index,
                difficulty: self.difficulty,
            });
        }

        self.blocks.push(block);
        Ok(self.latest())
    }

    /// Record one vote: stage, mine, attach. Blocks the caller for the whole
    /// proof-of-work search; the async service wraps this sequence to keep it
    /// off latency-sensitive threads.
    pub fn append(
        &mut self,
        payload: VotePayload,
        cancel: &CancelToken,
    ) -> Result<&Block, AppendError> {
        let mut block = self.stage(payload, Timestamp::now());
        miner::mine(&mut block, self.difficulty, cancel)?;
        Ok(self.commit(block)?)
    }

    /// Undo the most recent append after a failed persistence write.
    ///
    /// Crate-internal: the public contract is append-only. Never removes
    /// genesis.
    pub(crate) fn rollback_latest(&mut self) -> Option<Block> {
        if self.blocks.len() > 1 {
            self.blocks.pop()
        } else {
            None
        }
    }

    /// Re-derive every digest and link across the chain.
    ///
    /// Stops at the first failure, reporting the failing sequence position.
    /// Recomputing the hash catches payload and nonce tampering without
    /// re-mining; the link check catches reordering and splicing.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        for (position, block) in self.blocks.iter().enumerate().skip(1) {
            if block.hash != block.compute_hash() {
                return Err(IntegrityError::HashMismatch {
                    index: position as u64,
                });
            }

            if block.previous_hash.as_ref() != Some(&self.blocks[position - 1].hash) {
                return Err(IntegrityError::BrokenLink {
                    index: position as u64,
                });
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }

    /// Per-candidate vote counts over blocks 1..end.
    ///
    /// Genesis is always excluded; records without a candidate are skipped
    /// rather than failing the scan. Presentation order is the caller's
    /// concern.
    pub fn tally(&self) -> HashMap<CandidateId, u64> {
        let mut counts = HashMap::new();

        for block in &self.blocks[1..] {
            if let Some(candidate) = block.data.candidate() {
                *counts.entry(candidate.clone()).or_insert(0) += 1;
            }
        }

        counts
    }

    /// Whether a vote carrying this fingerprint is already on the chain.
    ///
    /// Linear scan; chain length is bounded by the voter population, not by
    /// request volume.
    pub fn has_voted(&self, fingerprint: &VoterFingerprint) -> bool {
        self.blocks[1..]
            .iter()
            .any(|block| block.data.fingerprint() == Some(fingerprint))
    }

    /// Number of vote records on the chain (genesis excluded)
    pub fn vote_count(&self) -> u64 {
        self.blocks[1..]
            .iter()
            .filter(|block| block.data.candidate().is_some())
            .count() as u64
    }
}

/// A single block failed the integrity scan: the chain is corrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("chain corrupted: block {index} hash does not match its contents")]
    HashMismatch { index: u64 },

    #[error("chain corrupted: block {index} is not linked to its predecessor")]
    BrokenLink { index: u64 },
}

impl IntegrityError {
    /// Sequence position of the first block that failed the scan
    pub fn index(&self) -> u64 {
        match self {
            Self::HashMismatch { index } | Self::BrokenLink { index } => *index,
        }
    }
}

/// A sealed block was rejected at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("block index {got} does not extend the chain at height {expected}")]
    IndexGap { expected: u64, got: u64 },

    #[error("block {index} was staged against a stale tip")]
    StaleParent { index: u64 },

    #[error("block {index} hash does not match its contents")]
    InvalidSeal { index: u64 },

    #[error("block {index} does not meet difficulty {difficulty}")]
    InsufficientWork { index: u64, difficulty: u8 },
}

/// Append failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AppendError {
    #[error(transparent)]
    Aborted(#[from] MiningAborted),

    #[error(transparent)]
    Rejected(#[from] ChainError),
}
