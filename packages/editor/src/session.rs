//! # Edit Session Management
//!
//! An EditSession is one client's working copy of a template: the document
//! being edited, the selected block, and whether there are unsaved changes.
//! Edits are local until the caller saves the patch from [`EditSession::to_patch`].

use crate::{EditorError, Mutation, MutationError, MutationResult};
use mailforge_compiler_html::{compile, compile_plain_text};
use mailforge_model::{Block, Context, Document, DocumentPatch, SaveOutcome, UserId, Visibility};
use std::collections::HashSet;

pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    document: Document,
    selected_block: Option<String>,
    /// Ids removed during this session; never handed out again
    retired: HashSet<String>,
    dirty: bool,
    version: u64,
}

impl EditSession {
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        Self {
            id: id.into(),
            document,
            selected_block: None,
            retired: HashSet::new(),
            dirty: false,
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a mutation to the local document.
    ///
    /// Blocks created by the mutation become the selection; removing the
    /// selected block clears it. An id removed earlier in the session cannot
    /// be inserted again.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        if let Mutation::InsertBlock { block, .. } = &mutation {
            if self.retired.contains(&block.id) {
                return Err(MutationError::RetiredBlockId(block.id.clone()).into());
            }
        }

        let created_block = mutation.apply(&mut self.document)?;

        self.version += 1;
        self.dirty = true;

        if let Some(id) = &created_block {
            self.selected_block = Some(id.clone());
        }
        if let Mutation::RemoveBlock { block_id } = &mutation {
            if self.selected_block.as_deref() == Some(block_id.as_str()) {
                self.selected_block = None;
            }
            self.retired.insert(block_id.clone());
        }

        Ok(MutationResult {
            version: self.version,
            created_block,
        })
    }

    /// Apply several mutations, stopping at the first failure.
    pub fn apply_all(
        &mut self,
        mutations: impl IntoIterator<Item = Mutation>,
    ) -> Result<u64, EditorError> {
        for mutation in mutations {
            self.apply(mutation)?;
        }
        Ok(self.version)
    }

    /// Update selection
    pub fn select(&mut self, block_id: Option<&str>) -> Result<(), EditorError> {
        match block_id {
            Some(id) if self.document.find_block(id).is_none() => {
                Err(EditorError::UnknownSelection(id.to_string()))
            }
            other => {
                self.selected_block = other.map(str::to_string);
                Ok(())
            }
        }
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_block
            .as_deref()
            .and_then(|id| self.document.find_block(id))
    }

    /// Compile the working copy to HTML.
    pub fn preview(&self, context: &Context) -> String {
        compile(Some(self.document.blocks.as_slice()), context)
    }

    /// Plain-text rendering of the working copy.
    pub fn preview_text(&self, context: &Context) -> String {
        compile_plain_text(Some(self.document.blocks.as_slice()), context)
    }

    /// The patch a save request carries: every editable field.
    pub fn to_patch(&self) -> Result<DocumentPatch, EditorError> {
        Ok(DocumentPatch {
            name: Some(self.document.name.clone()),
            category: Some(self.document.category.clone()),
            subject: Some(self.document.subject.clone()),
            description: Some(self.document.description.clone().unwrap_or_default()),
            blocks: Some(serde_json::to_value(&self.document.blocks)?),
            visibility: Some(self.document.visibility),
        })
    }

    /// Record a completed save.
    ///
    /// When the save forked the document, the working copy becomes the fork:
    /// new id, owned by `requester`, private, derived from the previous id.
    pub fn mark_saved(&mut self, outcome: &SaveOutcome, requester: &UserId) {
        if outcome.created {
            let previous = std::mem::replace(&mut self.document.id, outcome.id.clone());
            self.document.forked_from = Some(previous);
            self.document.owner = requester.clone();
            self.document.visibility = Visibility::Private;
        }
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mailforge_model::{defaults, BlockContent, BlockKind, DocumentId};

    fn document() -> Document {
        Document {
            id: DocumentId::new("t1"),
            owner: UserId::new("alice"),
            name: "Welcome".to_string(),
            category: "Onboarding".to_string(),
            subject: "Hi".to_string(),
            description: None,
            visibility: Visibility::Public,
            forked_from: None,
            blocks: defaults::default_blocks(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_creation() {
        let session = EditSession::new("client-1", document());

        assert_eq!(session.id, "client-1");
        assert_eq!(session.version(), 0);
        assert!(!session.is_dirty());
        assert!(session.selected_block().is_none());
    }

    #[test]
    fn test_apply_bumps_version_and_selects_new_block() {
        let mut session = EditSession::new("client-1", document());
        let result = session
            .apply(Mutation::AddBlock { kind: BlockKind::Image, index: Some(0) })
            .unwrap();

        assert_eq!(result.version, 1);
        assert!(session.is_dirty());
        let selected = session.selected_block().unwrap();
        assert_eq!(Some(selected.id.clone()), result.created_block);
        assert_eq!(session.document().blocks[0].id, selected.id);
    }

    #[test]
    fn test_failed_mutation_changes_nothing() {
        let mut session = EditSession::new("client-1", document());
        let result = session.apply(Mutation::RemoveBlock { block_id: "nope".to_string() });

        assert!(result.is_err());
        assert_eq!(session.version(), 0);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_removing_selected_block_clears_selection() {
        let mut session = EditSession::new("client-1", document());
        session.select(Some("s2")).unwrap();
        session
            .apply(Mutation::RemoveBlock { block_id: "s2".to_string() })
            .unwrap();
        assert!(session.selected_block().is_none());
    }

    #[test]
    fn test_removed_block_id_is_not_reused() {
        let mut session = EditSession::new("client-1", document());
        session
            .apply(Mutation::RemoveBlock { block_id: "s1".to_string() })
            .unwrap();
        let version = session.version();

        let result = session.apply(Mutation::InsertBlock {
            block: Block::new("s1", BlockContent::Spacer),
            index: Some(0),
        });
        assert!(matches!(
            result,
            Err(EditorError::Mutation(MutationError::RetiredBlockId(ref id))) if id == "s1"
        ));
        assert_eq!(session.version(), version);
        assert!(session.document().find_block("s1").is_none());

        // A fresh id is still accepted.
        let result = session
            .apply(Mutation::InsertBlock {
                block: Block::new("s1-copy", BlockContent::Spacer),
                index: Some(0),
            })
            .unwrap();
        assert_eq!(result.created_block.as_deref(), Some("s1-copy"));
    }

    #[test]
    fn test_select_unknown_block() {
        let mut session = EditSession::new("client-1", document());
        assert!(matches!(
            session.select(Some("missing")),
            Err(EditorError::UnknownSelection(_))
        ));
        assert!(session.select(None).is_ok());
    }

    #[test]
    fn test_mark_saved_adopts_fork() {
        let mut session = EditSession::new("client-1", document());
        session
            .apply(Mutation::SetName { value: "Mine".to_string() })
            .unwrap();

        let bob = UserId::new("bob");
        let outcome = SaveOutcome {
            id: DocumentId::new("t2"),
            created: true,
        };
        session.mark_saved(&outcome, &bob);

        let doc = session.document();
        assert_eq!(doc.id, DocumentId::new("t2"));
        assert_eq!(doc.forked_from, Some(DocumentId::new("t1")));
        assert_eq!(doc.owner, bob);
        assert_eq!(doc.visibility, Visibility::Private);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_mark_saved_in_place_keeps_identity() {
        let mut session = EditSession::new("client-1", document());
        let outcome = SaveOutcome {
            id: DocumentId::new("t1"),
            created: false,
        };
        session.mark_saved(&outcome, &UserId::new("alice"));

        assert_eq!(session.document().id, DocumentId::new("t1"));
        assert_eq!(session.document().forked_from, None);
        assert_eq!(session.document().visibility, Visibility::Public);
    }
}
