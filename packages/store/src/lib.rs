//! # Template persistence
//!
//! The [`TemplateStore`] trait is the only way the workspace touches stored
//! templates. Writes that depend on ownership are expressed as single
//! conditional statements (`update_where_owner`, `delete_where_owner`) so a
//! check and its write can never be split by a concurrent request.

mod errors;
mod memory;
mod sqlite;

pub use errors::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use mailforge_model::{
    Document, DocumentId, DocumentRecord, DocumentSummary, FieldUpdate, UserId,
};

pub trait TemplateStore: Send + Sync {
    fn get_by_id(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError>;

    /// Public documents plus those owned by `requester`, newest first.
    fn list_visible_to(&self, requester: &UserId) -> Result<Vec<DocumentSummary>, StoreError>;

    fn insert(&self, document: &Document) -> Result<DocumentId, StoreError>;

    /// Unconditional field update. Returns affected rows.
    fn update_fields(&self, id: &DocumentId, update: &FieldUpdate) -> Result<usize, StoreError>;

    /// Update only if `owner` still owns the row. Returns affected rows.
    fn update_where_owner(
        &self,
        id: &DocumentId,
        owner: &UserId,
        update: &FieldUpdate,
    ) -> Result<usize, StoreError>;

    /// Delete only if `owner` owns the row. Returns affected rows.
    fn delete_where_owner(&self, id: &DocumentId, owner: &UserId) -> Result<usize, StoreError>;
}

pub(crate) fn to_record(document: &Document) -> Result<DocumentRecord, StoreError> {
    Ok(DocumentRecord {
        id: document.id.clone(),
        owner: document.owner.clone(),
        name: document.name.clone(),
        category: document.category.clone(),
        subject: document.subject.clone(),
        description: document.description.clone(),
        visibility: document.visibility,
        forked_from: document.forked_from.clone(),
        blocks: serde_json::to_value(&document.blocks)?,
        updated_at: document.updated_at,
    })
}
