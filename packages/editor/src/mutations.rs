//! # Document Mutations
//!
//! High-level operations the editing surface performs on a document.
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: each mutation is one user action
//! 2. **Validated**: `apply` validates first and leaves the document
//!    untouched on error
//! 3. **Block ids are stable**: new blocks get fresh ids; ids are never
//!    reused
//!
//! ## Mutation Semantics
//!
//! ### MoveBlock
//! - `index` is the block's position after the move
//! - Indices past the end clamp to the last position
//!
//! ### SetBlockData / SetBlockStyle
//! - Atomic replacement of one key
//! - Data keys are checked against the block's payload shape

use mailforge_model::{
    defaults, new_block_id, Block, BlockKind, Document, Scalar, Visibility,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Insert the palette default for `kind`; appended when `index` is absent
    AddBlock {
        kind: BlockKind,
        #[serde(default)]
        index: Option<usize>,
    },

    /// Insert a fully specified block
    InsertBlock {
        block: Block,
        #[serde(default)]
        index: Option<usize>,
    },

    RemoveBlock {
        block_id: String,
    },

    /// Move a block to an arbitrary position
    MoveBlock {
        block_id: String,
        index: usize,
    },

    /// Set one key of a block's data payload
    SetBlockData {
        block_id: String,
        key: String,
        value: Value,
    },

    /// Set one Style Map key; `None` removes it
    SetBlockStyle {
        block_id: String,
        key: String,
        #[serde(default)]
        value: Option<Scalar>,
    },

    SetName {
        value: String,
    },

    SetCategory {
        value: String,
    },

    SetSubject {
        value: String,
    },

    SetDescription {
        #[serde(default)]
        value: Option<String>,
    },

    SetVisibility {
        value: Visibility,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(String),

    #[error("Block id was removed earlier in this session: {0}")]
    RetiredBlockId(String),

    #[error("Block id must not be empty")]
    EmptyBlockId,

    #[error("Invalid data for block {block_id}: {reason}")]
    InvalidData { block_id: String, reason: String },
}

/// Result of applying a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    /// New version number
    pub version: u64,

    /// Id of the block created by `AddBlock` / `InsertBlock`
    pub created_block: Option<String>,
}

impl Mutation {
    /// Apply mutation to the document with validation.
    ///
    /// Returns the id of a newly created block, if any.
    pub fn apply(&self, doc: &mut Document) -> Result<Option<String>, MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::AddBlock { kind, index } => {
                let block = defaults::default_block(*kind, new_block_id());
                Ok(Some(Self::insert_at(doc, block, *index)))
            }

            Mutation::InsertBlock { block, index } => {
                Ok(Some(Self::insert_at(doc, block.clone(), *index)))
            }

            Mutation::RemoveBlock { block_id } => {
                let pos = Self::position(doc, block_id)?;
                doc.blocks.remove(pos);
                Ok(None)
            }

            Mutation::MoveBlock { block_id, index } => {
                let pos = Self::position(doc, block_id)?;
                let block = doc.blocks.remove(pos);
                let target = (*index).min(doc.blocks.len());
                doc.blocks.insert(target, block);
                Ok(None)
            }

            Mutation::SetBlockData { block_id, key, value } => {
                let block = doc
                    .find_block_mut(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                block
                    .set_data_field(key, value.clone())
                    .map_err(|e| MutationError::InvalidData {
                        block_id: block_id.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(None)
            }

            Mutation::SetBlockStyle { block_id, key, value } => {
                let block = doc
                    .find_block_mut(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                match value {
                    Some(value) => {
                        block.style.insert(key.clone(), value.clone());
                    }
                    None => {
                        block.style.shift_remove(key);
                    }
                }
                Ok(None)
            }

            Mutation::SetName { value } => {
                doc.name = value.clone();
                Ok(None)
            }

            Mutation::SetCategory { value } => {
                doc.category = value.clone();
                Ok(None)
            }

            Mutation::SetSubject { value } => {
                doc.subject = value.clone();
                Ok(None)
            }

            Mutation::SetDescription { value } => {
                doc.description = value.clone().filter(|d| !d.is_empty());
                Ok(None)
            }

            Mutation::SetVisibility { value } => {
                doc.visibility = *value;
                Ok(None)
            }
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::InsertBlock { block, .. } => {
                if block.id.is_empty() {
                    return Err(MutationError::EmptyBlockId);
                }
                if doc.find_block(&block.id).is_some() {
                    return Err(MutationError::DuplicateBlockId(block.id.clone()));
                }
                if block.kind().is_none() {
                    return Err(MutationError::InvalidData {
                        block_id: block.id.clone(),
                        reason: format!("unknown block type: {}", block.content.type_name()),
                    });
                }
                Ok(())
            }

            Mutation::RemoveBlock { block_id } | Mutation::MoveBlock { block_id, .. } => {
                Self::position(doc, block_id).map(|_| ())
            }

            Mutation::SetBlockData { block_id, key, value } => {
                let block = doc
                    .find_block(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                // Dry run on a copy so a bad value never reaches the document.
                let mut probe = block.clone();
                probe
                    .set_data_field(key, value.clone())
                    .map_err(|e| MutationError::InvalidData {
                        block_id: block_id.clone(),
                        reason: e.to_string(),
                    })
            }

            Mutation::SetBlockStyle { block_id, .. } => {
                doc.find_block(block_id)
                    .map(|_| ())
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))
            }

            Mutation::AddBlock { .. }
            | Mutation::SetName { .. }
            | Mutation::SetCategory { .. }
            | Mutation::SetSubject { .. }
            | Mutation::SetDescription { .. }
            | Mutation::SetVisibility { .. } => Ok(()),
        }
    }

    fn position(doc: &Document, block_id: &str) -> Result<usize, MutationError> {
        doc.block_index(block_id)
            .ok_or_else(|| MutationError::BlockNotFound(block_id.to_string()))
    }

    fn insert_at(doc: &mut Document, block: Block, index: Option<usize>) -> String {
        let id = block.id.clone();
        let target = index.unwrap_or(doc.blocks.len()).min(doc.blocks.len());
        doc.blocks.insert(target, block);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mailforge_model::{BlockContent, DocumentId, TextData, UserId};
    use serde_json::json;

    fn doc_with(ids: &[&str]) -> Document {
        Document {
            id: DocumentId::new("d1"),
            owner: UserId::new("alice"),
            name: "Doc".to_string(),
            category: "Other".to_string(),
            subject: "Subject".to_string(),
            description: None,
            visibility: Visibility::Private,
            forked_from: None,
            blocks: ids
                .iter()
                .map(|id| Block::new(*id, BlockContent::Text(TextData::default())))
                .collect(),
            updated_at: Utc::now(),
        }
    }

    fn order(doc: &Document) -> Vec<&str> {
        doc.blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::MoveBlock {
            block_id: "s2".to_string(),
            index: 0,
        };

        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json, json!({ "type": "moveBlock", "blockId": "s2", "index": 0 }));

        let deserialized: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_move_to_arbitrary_index() {
        let mut doc = doc_with(&["a", "b", "c", "d"]);

        Mutation::MoveBlock { block_id: "a".to_string(), index: 2 }
            .apply(&mut doc)
            .unwrap();
        assert_eq!(order(&doc), vec!["b", "c", "a", "d"]);

        Mutation::MoveBlock { block_id: "d".to_string(), index: 0 }
            .apply(&mut doc)
            .unwrap();
        assert_eq!(order(&doc), vec!["d", "b", "c", "a"]);

        Mutation::MoveBlock { block_id: "b".to_string(), index: 99 }
            .apply(&mut doc)
            .unwrap();
        assert_eq!(order(&doc), vec!["d", "c", "a", "b"]);
    }

    #[test]
    fn test_add_block_appends_palette_default() {
        let mut doc = doc_with(&["a"]);
        let created = Mutation::AddBlock { kind: BlockKind::Spacer, index: None }
            .apply(&mut doc)
            .unwrap()
            .unwrap();

        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[1].id, created);
        assert_eq!(doc.blocks[1].kind(), Some(BlockKind::Spacer));
        assert_eq!(doc.blocks[1].style["height"].to_string(), "30px");
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut doc = doc_with(&["a"]);
        let mutation = Mutation::InsertBlock {
            block: Block::new("a", BlockContent::Spacer),
            index: Some(0),
        };

        assert_eq!(
            mutation.apply(&mut doc),
            Err(MutationError::DuplicateBlockId("a".to_string()))
        );
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn test_remove_missing_block() {
        let mut doc = doc_with(&["a"]);
        let result = Mutation::RemoveBlock { block_id: "zzz".to_string() }.apply(&mut doc);
        assert_eq!(result, Err(MutationError::BlockNotFound("zzz".to_string())));
    }

    #[test]
    fn test_set_block_data_validates_shape() {
        let mut doc = doc_with(&["a"]);
        let before = doc.clone();

        let bad = Mutation::SetBlockData {
            block_id: "a".to_string(),
            key: "content".to_string(),
            value: json!({ "not": "a string" }),
        };
        assert!(matches!(bad.apply(&mut doc), Err(MutationError::InvalidData { .. })));
        assert_eq!(doc, before);

        Mutation::SetBlockData {
            block_id: "a".to_string(),
            key: "content".to_string(),
            value: json!("Hello {{name}}"),
        }
        .apply(&mut doc)
        .unwrap();
        assert_eq!(
            doc.blocks[0].content,
            BlockContent::Text(TextData { content: "Hello {{name}}".to_string() })
        );
    }

    #[test]
    fn test_set_and_remove_style() {
        let mut doc = doc_with(&["a"]);
        Mutation::SetBlockStyle {
            block_id: "a".to_string(),
            key: "color".to_string(),
            value: Some(Scalar::from("#111")),
        }
        .apply(&mut doc)
        .unwrap();
        assert_eq!(doc.blocks[0].style["color"].to_string(), "#111");

        Mutation::SetBlockStyle {
            block_id: "a".to_string(),
            key: "color".to_string(),
            value: None,
        }
        .apply(&mut doc)
        .unwrap();
        assert!(doc.blocks[0].style.is_empty());
    }

    #[test]
    fn test_metadata_mutations() {
        let mut doc = doc_with(&[]);
        Mutation::SetName { value: "Launch".to_string() }.apply(&mut doc).unwrap();
        Mutation::SetVisibility { value: Visibility::Public }.apply(&mut doc).unwrap();
        Mutation::SetDescription { value: Some(String::new()) }.apply(&mut doc).unwrap();

        assert_eq!(doc.name, "Launch");
        assert_eq!(doc.visibility, Visibility::Public);
        assert_eq!(doc.description, None);
    }
}
