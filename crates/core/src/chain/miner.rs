/// Proof-of-work sealing
///
/// Mining brute-forces a nonce until the block hash starts with the required
/// number of zero hex digits. The expected cost is 16^difficulty hash
/// evaluations and the worst case is unbounded; there is deliberately no
/// internal timeout, so callers must run the search off any latency-sensitive
/// thread and hold a [`CancelToken`] to abort it.
use super::block::Block;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared flag aborting an in-flight mining search.
///
/// Cloned handles observe the same flag; tripping any of them stops every
/// search polling it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The mining search was cancelled before a valid nonce was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("mining aborted before a valid nonce was found")]
pub struct MiningAborted;

/// Seal a block by searching for a nonce that meets `difficulty`.
///
/// Mutates `nonce` and `hash` in place. A difficulty of 0 succeeds
/// immediately with nonce 0.
pub fn mine(block: &mut Block, difficulty: u8, cancel: &CancelToken) -> Result<(), MiningAborted> {
    loop {
        if block.meets_difficulty(difficulty) {
            debug!("block mined: {} (nonce {})", block.hash, block.nonce);
            return Ok(());
        }

        if cancel.is_cancelled() {
            return Err(MiningAborted);
        }

        block.nonce += 1;
        block.hash = block.compute_hash();
    }
}
