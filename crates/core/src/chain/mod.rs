/// The tamper-evident vote ledger
///
/// Blocks record anonymized vote events; each is sealed by proof-of-work and
/// linked to its predecessor by digest. The chain exposes append plus the
/// derived reads: integrity verification, tallying, and duplicate detection.

mod block;
mod codec;
mod ledger;
mod miner;
mod payload;

pub use block::{Block, BlockHash, HashParseError, GENESIS_PARENT};
pub use codec::{decode, encode, CodecError};
pub use ledger::{AppendError, ChainError, IntegrityError, VoteChain};
pub use miner::{mine, CancelToken, MiningAborted};
pub use payload::{BlockData, VotePayload};
