/// Chain persistence
///
/// The ledger's storage dependency is a named collaborator injected at
/// construction time, never ambient state. The persisted representation is a
/// single JSON document holding the whole chain; every save rewrites it
/// wholesale.
use crate::chain::{self, CodecError, VoteChain};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Where a chain document lives between process runs
pub trait ChainStore: Send + Sync {
    /// Load the persisted chain, `None` if nothing has been stored yet.
    ///
    /// Integrity is not checked here; the caller decides what to do with a
    /// corrupted document.
    fn load(&self, difficulty: u8) -> Result<Option<VoteChain>, StoreError>;

    /// Persist the whole chain, replacing any previous document
    fn save(&self, chain: &VoteChain) -> Result<(), StoreError>;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read chain document: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write chain document: {0}")]
    Write(#[source] io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("chain store unavailable")]
    Unavailable,
}

/// Whole-document JSON file store
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChainStore for JsonFileStore {
    fn load(&self, difficulty: u8) -> Result<Option<VoteChain>, StoreError> {
        let document = match std::fs::read_to_string(&self.path) {
            Ok(document) => document,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no chain document at {}", self.path.display());
                return Ok(None);
            }
            Err(err) => return Err(StoreError::Read(err)),
        };

        let chain = chain::decode(&document, difficulty)?;
        debug!(
            "loaded {} blocks from {}",
            chain.len(),
            self.path.display()
        );
        Ok(Some(chain))
    }

    fn save(&self, chain: &VoteChain) -> Result<(), StoreError> {
        let document = chain::encode(chain)?;
        std::fs::write(&self.path, document).map_err(StoreError::Write)?;
        debug!(
            "saved {} blocks to {}",
            chain.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-process store for tests and embedding.
///
/// Can be switched into a failing mode to exercise the unconfirmed-vote path
/// without touching a filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save (and load) report `Unavailable`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

impl ChainStore for MemoryStore {
    fn load(&self, difficulty: u8) -> Result<Option<VoteChain>, StoreError> {
        self.check_available()?;

        let document = self.document.lock().expect("memory store mutex poisoned");
        match document.as_deref() {
            Some(document) => Ok(Some(chain::decode(document, difficulty)?)),
            None => Ok(None),
        }
    }

    fn save(&self, chain: &VoteChain) -> Result<(), StoreError> {
        self.check_available()?;

        let encoded = chain::encode(chain)?;
        *self.document.lock().expect("memory store mutex poisoned") = Some(encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{CancelToken, VotePayload};
    use votechain_common::{CandidateId, VoterFingerprint, FINGERPRINT_LEN};

    const DIFFICULTY: u8 = 1;

    fn sample_chain() -> VoteChain {
        let mut chain = VoteChain::new(DIFFICULTY);
        let payload = VotePayload::new(
            VoterFingerprint::from_bytes([1; FINGERPRINT_LEN]),
            CandidateId::new("A").unwrap(),
        );
        chain.append(payload, &CancelToken::new()).unwrap();
        chain
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("chain.json"));

        let chain = sample_chain();
        store.save(&chain).unwrap();

        let restored = store.load(DIFFICULTY).unwrap().unwrap();
        assert_eq!(restored.blocks(), chain.blocks());
        restored.verify().unwrap();
    }

    #[test]
    fn test_file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        assert!(store.load(DIFFICULTY).unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(&path, "not a chain").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.load(DIFFICULTY),
            Err(StoreError::Codec(_))
        ));
    }

    #[test]
    fn test_file_store_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("chain.json"));

        let mut chain = sample_chain();
        store.save(&chain).unwrap();

        let payload = VotePayload::new(
            VoterFingerprint::from_bytes([2; FINGERPRINT_LEN]),
            CandidateId::new("B").unwrap(),
        );
        chain.append(payload, &CancelToken::new()).unwrap();
        store.save(&chain).unwrap();

        let restored = store.load(DIFFICULTY).unwrap().unwrap();
        assert_eq!(restored.len(), 3);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load(DIFFICULTY).unwrap().is_none());

        let chain = sample_chain();
        store.save(&chain).unwrap();

        let restored = store.load(DIFFICULTY).unwrap().unwrap();
        assert_eq!(restored.blocks(), chain.blocks());
    }

    #[test]
    fn test_memory_store_failing_mode() {
        let store = MemoryStore::new();
        store.set_failing(true);

        let chain = sample_chain();
        assert!(matches!(store.save(&chain), Err(StoreError::Unavailable)));

        store.set_failing(false);
        store.save(&chain).unwrap();
    }
}
