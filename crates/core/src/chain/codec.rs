use super::block::Block;
use super::ledger::VoteChain;

/// Chain document (de)serialization errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("chain document is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("chain document contains no blocks")]
    EmptyChain,
}

/// Encode the whole chain as a JSON array of block records.
///
/// Stored `hash` and `nonce` values are written out field-for-field; nothing
/// is re-mined or re-derived.
pub fn encode(chain: &VoteChain) -> Result<String, CodecError> {
    Ok(serde_json::to_string(chain.blocks())?)
}

/// Rebuild a chain from a persisted JSON document.
///
/// Each block is reconstructed exactly from its stored fields. Integrity is
/// deliberately NOT checked here; callers run [`VoteChain::verify`] as an
/// explicit step after loading.
pub fn decode(document: &str, difficulty: u8) -> Result<VoteChain, CodecError> {
    let blocks: Vec<Block> = serde_json::from_str(document)?;

    if blocks.is_empty() {
        return Err(CodecError::EmptyChain);
    }

    Ok(VoteChain::from_blocks(blocks, difficulty))
}
