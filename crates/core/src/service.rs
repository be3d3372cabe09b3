/// Ledger service runtime
///
/// Owns the chain behind an async lock and couples every append to a
/// persistence write. Mining is CPU-bound and unbounded, so it runs on a
/// blocking worker; the service's cancel token lets a shutdown abort an
/// in-flight search cleanly.
use crate::chain::{
    self, Block, CancelToken, ChainError, IntegrityError, MiningAborted, VoteChain, VotePayload,
};
use crate::store::{ChainStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use votechain_common::{CandidateId, LedgerConfig, Timestamp, VoterFingerprint};

/// Vote submission errors
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("this voter has already cast a ballot")]
    AlreadyVoted,

    #[error(transparent)]
    Aborted(#[from] MiningAborted),

    #[error(transparent)]
    Rejected(#[from] ChainError),

    #[error("vote not confirmed: {0}")]
    Unconfirmed(#[source] StoreError),

    #[error("mining worker failed: {0}")]
    Worker(String),
}

/// Summary counters for the admin surface
#[derive(Debug, Clone, Copy)]
pub struct LedgerStats {
    pub blocks: usize,
    pub votes: u64,
    pub difficulty: u8,
}

/// Explicitly owned ledger runtime.
///
/// Constructed once at startup and passed by handle to whatever serves
/// requests; the persistence collaborator is injected, never reached through
/// globals.
pub struct LedgerService {
    chain: RwLock<VoteChain>,
    store: Arc<dyn ChainStore>,
    cancel: CancelToken,
}

impl LedgerService {
    /// Restore the chain from the store, or start fresh.
    ///
    /// A store failure falls back to an in-memory genesis chain for this run:
    /// prior votes are not visible this session but the process stays up. A
    /// chain that loads but fails verification is corrupted; it is discarded
    /// loudly and replaced with a fresh genesis chain.
    pub fn open(config: &LedgerConfig, store: Arc<dyn ChainStore>) -> Self {
        let chain = match store.load(config.difficulty) {
            Ok(Some(chain)) => match chain.verify() {
                Ok(()) => {
                    info!("restored chain with {} blocks", chain.len());
                    chain
                }
                Err(err) => {
                    error!("{err}; discarding the stored chain and starting fresh");
                    VoteChain::new(config.difficulty)
                }
            },
            Ok(None) => {
                info!("no persisted chain; starting from genesis");
                VoteChain::new(config.difficulty)
            }
            Err(err) => {
                warn!("chain store unavailable ({err}); prior votes will not be visible this run");
                VoteChain::new(config.difficulty)
            }
        };

        Self {
            chain: RwLock::new(chain),
            store,
            cancel: CancelToken::new(),
        }
    }

    /// Record one vote: duplicate check, stage, mine, commit, persist.
    ///
    /// The entire sequence holds the write guard, so at most one append is in
    /// flight and readers observe either the pre- or post-append chain. If
    /// the persistence write fails the freshly attached block is rolled back
    /// and the vote is reported unconfirmed, never accepted.
    pub async fn cast_vote(&self, payload: VotePayload) -> Result<Block, VoteError> {
        let mut chain = self.chain.write().await;

        if chain.has_voted(&payload.identity_fingerprint) {
            return Err(VoteError::AlreadyVoted);
        }

        let staged = chain.stage(payload, Timestamp::now());
        let difficulty = chain.difficulty();
        let cancel = self.cancel.clone();

        // Proof-of-work off the async threads
        let mined = tokio::task::spawn_blocking(move || {
            let mut block = staged;
            chain::mine(&mut block, difficulty, &cancel)?;
            Ok::<_, MiningAborted>(block)
        })
        .await
        .map_err(|err| VoteError::Worker(err.to_string()))??;

        let sealed = chain.commit(mined)?.clone();

        if let Err(err) = self.store.save(&chain) {
            chain.rollback_latest();
            error!("failed to persist vote: {err}");
            return Err(VoteError::Unconfirmed(err));
        }

        info!("vote sealed in block {} ({})", sealed.index, sealed.hash);
        Ok(sealed)
    }

    /// Per-candidate vote counts
    pub async fn tally(&self) -> HashMap<CandidateId, u64> {
        self.chain.read().await.tally()
    }

    /// Duplicate-vote guard for the submission collaborator
    pub async fn has_voted(&self, fingerprint: &VoterFingerprint) -> bool {
        self.chain.read().await.has_voted(fingerprint)
    }

    /// Full-chain integrity scan
    pub async fn verify(&self) -> Result<(), IntegrityError> {
        let result = self.chain.read().await.verify();
        if let Err(err) = &result {
            error!("{err}");
        }
        result
    }

    /// Copy of the whole chain for admin inspection
    pub async fn snapshot(&self) -> Vec<Block> {
        self.chain.read().await.blocks().to_vec()
    }

    pub async fn stats(&self) -> LedgerStats {
        let chain = self.chain.read().await;
        LedgerStats {
            blocks: chain.len(),
            votes: chain.vote_count(),
            difficulty: chain.difficulty(),
        }
    }

    /// Abort any in-flight mining search; the interrupted vote is lost, as if
    /// the process had crashed mid-append
    pub fn shutdown(&self) {
        info!("shutting down; cancelling in-flight mining");
        self.cancel.cancel();
    }
}
