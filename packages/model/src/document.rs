//! # Documents
//!
//! A [`Document`] is a complete email template: ordered blocks plus
//! metadata, ownership and visibility. [`DocumentRecord`] is the persisted
//! row, whose `blocks` column may come back either as structured JSON or as
//! serialized text.

use crate::{decode_blocks, defaults, validate_blocks, Block, DocumentId, ModelError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub owner: UserId,
    pub name: String,
    pub category: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forked_from: Option<DocumentId>,
    /// Rendering order.
    pub blocks: Vec<Block>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Decode a persisted row. Fails when the stored blocks are not valid
    /// structured data.
    pub fn from_record(record: DocumentRecord) -> Result<Self, ModelError> {
        let blocks = decode_blocks(&record.blocks)?;
        Ok(Self {
            id: record.id,
            owner: record.owner,
            name: record.name,
            category: record.category,
            subject: record.subject,
            description: record.description,
            visibility: record.visibility,
            forked_from: record.forked_from,
            blocks,
            updated_at: record.updated_at,
        })
    }

    /// Whether `requester` may read this document.
    pub fn is_visible_to(&self, requester: &UserId) -> bool {
        self.visibility == Visibility::Public || &self.owner == requester
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            owner: self.owner.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            subject: self.subject.clone(),
            visibility: self.visibility,
            forked_from: self.forked_from.clone(),
            updated_at: self.updated_at,
        }
    }

    pub fn find_block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    pub fn find_block_mut(&mut self, block_id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == block_id)
    }

    pub fn block_index(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }
}

/// A document row as the persistence layer hands it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub owner: UserId,
    pub name: String,
    pub category: String,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub forked_from: Option<DocumentId>,
    /// Either a JSON array or a string holding one.
    pub blocks: Value,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            owner: self.owner.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            subject: self.subject.clone(),
            visibility: self.visibility,
            forked_from: self.forked_from.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry, without blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub owner: UserId,
    pub name: String,
    pub category: String,
    pub subject: String,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forked_from: Option<DocumentId>,
    pub updated_at: DateTime<Utc>,
}

/// Creation input. Every field is optional and falls back to the starter
/// template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "sections")]
    pub blocks: Option<Value>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl NewDocument {
    pub fn into_document(
        self,
        id: DocumentId,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<Document, ModelError> {
        let blocks = match &self.blocks {
            Some(payload) => {
                let blocks = decode_blocks(payload)?;
                validate_blocks(&blocks)?;
                blocks
            }
            None => defaults::default_blocks(),
        };

        Ok(Document {
            id,
            owner,
            name: self.name.unwrap_or_else(|| defaults::UNTITLED_NAME.to_string()),
            category: self
                .category
                .unwrap_or_else(|| defaults::DEFAULT_CATEGORY.to_string()),
            subject: self
                .subject
                .unwrap_or_else(|| defaults::DEFAULT_SUBJECT.to_string()),
            description: self.description.filter(|d| !d.is_empty()),
            visibility: self.visibility.unwrap_or_default(),
            forked_from: None,
            blocks,
            updated_at: now,
        })
    }
}

/// Save request body: any subset of the editable fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// An empty string clears the description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "sections", skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl DocumentPatch {
    /// Decode and validate into the field update a store applies.
    pub fn into_update(self) -> Result<FieldUpdate, ModelError> {
        let blocks = match &self.blocks {
            Some(payload @ (Value::Array(_) | Value::String(_))) => {
                let blocks = decode_blocks(payload)?;
                validate_blocks(&blocks)?;
                Some(blocks)
            }
            Some(Value::Null) | None => None,
            Some(Value::Bool(_)) => return Err(ModelError::NotASequence("boolean")),
            Some(Value::Number(_)) => return Err(ModelError::NotASequence("number")),
            Some(Value::Object(_)) => return Err(ModelError::NotASequence("object")),
        };

        Ok(FieldUpdate {
            name: self.name,
            category: self.category,
            subject: self.subject,
            description: self.description.map(|d| Some(d).filter(|d| !d.is_empty())),
            blocks,
            visibility: self.visibility,
        })
    }
}

/// Result of a save: where the write landed and whether it created a fork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub id: DocumentId,
    pub created: bool,
}

/// Decoded, validated set of field changes. `None` leaves a field untouched;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub description: Option<Option<String>>,
    pub blocks: Option<Vec<Block>>,
    pub visibility: Option<Visibility>,
}

impl FieldUpdate {
    pub fn is_empty(&self) -> bool {
        *self == FieldUpdate::default()
    }

    /// Apply to an in-memory document. Does not touch id, owner,
    /// forkedFrom or updatedAt.
    pub fn apply_to(&self, doc: &mut Document) {
        if let Some(name) = &self.name {
            doc.name = name.clone();
        }
        if let Some(category) = &self.category {
            doc.category = category.clone();
        }
        if let Some(subject) = &self.subject {
            doc.subject = subject.clone();
        }
        if let Some(description) = &self.description {
            doc.description = description.clone();
        }
        if let Some(blocks) = &self.blocks {
            doc.blocks = blocks.clone();
        }
        if let Some(visibility) = self.visibility {
            doc.visibility = visibility;
        }
    }
}
