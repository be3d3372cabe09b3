pub mod chain;
pub mod service;
pub mod store;

// Re-export chain types
pub use chain::{
    AppendError, Block, BlockData, BlockHash, CancelToken, ChainError, CodecError, HashParseError,
    IntegrityError, MiningAborted, VoteChain, VotePayload,
};

// Re-export persistence types
pub use store::{ChainStore, JsonFileStore, MemoryStore, StoreError};

// Re-export service types
pub use service::{LedgerService, LedgerStats, VoteError};
