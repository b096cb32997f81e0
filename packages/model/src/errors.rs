//! Error types for decoding and validating documents

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("blocks must be a sequence, found {0}")]
    NotASequence(&'static str),

    #[error("malformed blocks payload: {0}")]
    MalformedBlocks(#[from] serde_json::Error),

    #[error("block at index {0} has an empty id")]
    EmptyBlockId(usize),

    #[error("duplicate block id: {0}")]
    DuplicateBlockId(String),

    #[error("unknown block type: {0}")]
    UnknownBlockType(String),
}
