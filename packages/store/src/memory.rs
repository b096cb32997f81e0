use crate::{to_record, StoreError, TemplateStore};
use chrono::Utc;
use mailforge_model::{
    Document, DocumentId, DocumentRecord, DocumentSummary, FieldUpdate, UserId, Visibility,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// In-process store. Blocks are kept as structured JSON.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<DocumentId, DocumentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw row as-is, including blocks that may not decode.
    pub fn insert_record(&self, record: DocumentRecord) -> Result<(), StoreError> {
        self.rows()?.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rows(&self) -> Result<MutexGuard<'_, BTreeMap<DocumentId, DocumentRecord>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Backend("template table lock poisoned".to_string()))
    }
}

fn apply_update(record: &mut DocumentRecord, update: &FieldUpdate) -> Result<(), StoreError> {
    if let Some(name) = &update.name {
        record.name = name.clone();
    }
    if let Some(category) = &update.category {
        record.category = category.clone();
    }
    if let Some(subject) = &update.subject {
        record.subject = subject.clone();
    }
    if let Some(description) = &update.description {
        record.description = description.clone();
    }
    if let Some(blocks) = &update.blocks {
        record.blocks = serde_json::to_value(blocks)?;
    }
    if let Some(visibility) = update.visibility {
        record.visibility = visibility;
    }
    record.updated_at = Utc::now();
    Ok(())
}

impl TemplateStore for MemoryStore {
    fn get_by_id(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self.rows()?.get(id).cloned())
    }

    fn list_visible_to(&self, requester: &UserId) -> Result<Vec<DocumentSummary>, StoreError> {
        let mut summaries: Vec<DocumentSummary> = self
            .rows()?
            .values()
            .filter(|r| r.visibility == Visibility::Public || &r.owner == requester)
            .map(DocumentRecord::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn insert(&self, document: &Document) -> Result<DocumentId, StoreError> {
        let record = to_record(document)?;
        let mut rows = self.rows()?;
        if rows.contains_key(&record.id) {
            return Err(StoreError::Backend(format!(
                "template {} already exists",
                record.id
            )));
        }
        let id = record.id.clone();
        rows.insert(id.clone(), record);
        tracing::debug!(id = %id, "template inserted");
        Ok(id)
    }

    fn update_fields(&self, id: &DocumentId, update: &FieldUpdate) -> Result<usize, StoreError> {
        let mut rows = self.rows()?;
        match rows.get_mut(id) {
            Some(record) => {
                apply_update(record, update)?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn update_where_owner(
        &self,
        id: &DocumentId,
        owner: &UserId,
        update: &FieldUpdate,
    ) -> Result<usize, StoreError> {
        let mut rows = self.rows()?;
        match rows.get_mut(id) {
            Some(record) if &record.owner == owner => {
                apply_update(record, update)?;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    fn delete_where_owner(&self, id: &DocumentId, owner: &UserId) -> Result<usize, StoreError> {
        let mut rows = self.rows()?;
        let owned = rows.get(id).map(|r| &r.owner == owner).unwrap_or(false);
        if !owned {
            return Ok(0);
        }
        rows.remove(id);
        tracing::debug!(id = %id, "template deleted");
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailforge_model::defaults;

    fn document(id: &str, owner: &str, visibility: Visibility) -> Document {
        Document {
            id: DocumentId::new(id),
            owner: UserId::new(owner),
            name: format!("Template {}", id),
            category: "Other".to_string(),
            subject: "Hi".to_string(),
            description: None,
            visibility,
            forked_from: None,
            blocks: defaults::default_blocks(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = MemoryStore::new();
        let id = store
            .insert(&document("t1", "alice", Visibility::Public))
            .unwrap();

        let record = store.get_by_id(&id).unwrap().unwrap();
        assert_eq!(record.owner, UserId::new("alice"));
        assert!(record.blocks.is_array());
        assert!(store.get_by_id(&DocumentId::new("t2")).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        store.insert(&document("t1", "alice", Visibility::Public)).unwrap();
        assert!(store
            .insert(&document("t1", "bob", Visibility::Public))
            .is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_conditional_update_checks_owner() {
        let store = MemoryStore::new();
        let id = store
            .insert(&document("t1", "alice", Visibility::Public))
            .unwrap();
        let update = FieldUpdate {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };

        assert_eq!(
            store
                .update_where_owner(&id, &UserId::new("bob"), &update)
                .unwrap(),
            0
        );
        assert_eq!(store.get_by_id(&id).unwrap().unwrap().name, "Template t1");

        assert_eq!(
            store
                .update_where_owner(&id, &UserId::new("alice"), &update)
                .unwrap(),
            1
        );
        assert_eq!(store.get_by_id(&id).unwrap().unwrap().name, "Renamed");
    }

    #[test]
    fn test_conditional_delete_checks_owner() {
        let store = MemoryStore::new();
        let id = store
            .insert(&document("t1", "alice", Visibility::Public))
            .unwrap();

        assert_eq!(store.delete_where_owner(&id, &UserId::new("bob")).unwrap(), 0);
        assert!(!store.is_empty());
        assert_eq!(store.delete_where_owner(&id, &UserId::new("alice")).unwrap(), 1);
        assert!(store.is_empty());
    }
}
