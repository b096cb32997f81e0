//! # Template Service
//!
//! Request-level operations over stored templates. The service owns no
//! mutable state between calls: every operation is a read of the store,
//! a pure transformation, and at most one conditional write.
//!
//! ## Save state machine
//!
//! ```text
//! fetch(id) ── absent ──────────────────────────────▶ NotFound
//!    │
//!    ├─ owner == requester ─▶ update where id and owner
//!    │                          ├─ 1 row ─▶ { id, created: false }
//!    │                          └─ 0 rows ▶ NotFound (row vanished)
//!    │
//!    ├─ private ────────────────────────────────────▶ Forbidden
//!    │
//!    └─ public ─▶ insert fork (owner = requester, private,
//!                 forkedFrom = id) ─▶ { newId, created: true }
//! ```

use crate::errors::{WorkspaceError, WorkspaceResult};
use chrono::{Datelike, Utc};
use mailforge_compiler_html::{compile, compile_plain_text};
use mailforge_mailer::{validate_address, Delivery, MailTransport, OutgoingMail};
use mailforge_model::{
    decode_blocks, defaults, Context, Document, DocumentId, DocumentPatch, DocumentRecord,
    DocumentSummary, NewDocument, SaveOutcome, UserId, Visibility,
};
use mailforge_store::TemplateStore;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DEFAULT_SENDER: &str = "MailForge <noreply@mailforge.local>";
pub const FALLBACK_SUBJECT: &str = "No Subject";

#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
    transport: Arc<dyn MailTransport>,
    sender: String,
    default_context: Context,
}

impl TemplateService {
    pub fn new(store: Arc<dyn TemplateStore>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            store,
            transport,
            sender: DEFAULT_SENDER.to_string(),
            default_context: defaults::sample_context(Utc::now().year()),
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Extra default context values, layered over the built-in samples.
    pub fn with_default_context(mut self, context: Context) -> Self {
        self.default_context.extend(context);
        self
    }

    pub fn default_context(&self) -> &Context {
        &self.default_context
    }

    pub fn create(&self, requester: &UserId, input: NewDocument) -> WorkspaceResult<DocumentId> {
        let document = input.into_document(DocumentId::generate(), requester.clone(), Utc::now())?;
        let id = self.store.insert(&document)?;
        tracing::info!(id = %id, owner = %requester, "template created");
        Ok(id)
    }

    pub fn fetch(&self, id: &DocumentId, requester: &UserId) -> WorkspaceResult<Document> {
        let record = self.visible_record(id, requester)?;
        decode_record(record)
    }

    pub fn list(&self, requester: &UserId) -> WorkspaceResult<Vec<DocumentSummary>> {
        Ok(self.store.list_visible_to(requester)?)
    }

    /// Distinct non-empty categories across visible templates, sorted.
    pub fn categories(&self, requester: &UserId) -> WorkspaceResult<Vec<String>> {
        let categories: BTreeSet<String> = self
            .store
            .list_visible_to(requester)?
            .into_iter()
            .map(|summary| summary.category)
            .filter(|category| !category.trim().is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    pub fn save(
        &self,
        id: &DocumentId,
        requester: &UserId,
        patch: DocumentPatch,
    ) -> WorkspaceResult<SaveOutcome> {
        let current = self
            .store
            .get_by_id(id)?
            .ok_or_else(|| WorkspaceError::NotFound(id.clone()))?;
        let mut update = patch.into_update()?;

        if &current.owner == requester {
            let affected = self.store.update_where_owner(id, requester, &update)?;
            if affected == 0 {
                return Err(WorkspaceError::NotFound(id.clone()));
            }
            tracing::info!(id = %id, owner = %requester, "template updated in place");
            return Ok(SaveOutcome {
                id: id.clone(),
                created: false,
            });
        }

        if current.visibility == Visibility::Private {
            tracing::warn!(id = %id, requester = %requester, "save rejected on private template");
            return Err(WorkspaceError::Forbidden(id.clone()));
        }

        // Forks are always private, whatever the patch asked for.
        update.visibility = None;
        let blocks = match update.blocks.take() {
            Some(blocks) => blocks,
            None => decode_blocks(&current.blocks).map_err(|source| {
                WorkspaceError::Serialization {
                    id: id.clone(),
                    source,
                }
            })?,
        };

        let mut fork = Document {
            id: DocumentId::generate(),
            owner: requester.clone(),
            name: current.name,
            category: current.category,
            subject: current.subject,
            description: current.description,
            visibility: Visibility::Private,
            forked_from: Some(id.clone()),
            blocks,
            updated_at: Utc::now(),
        };
        update.apply_to(&mut fork);

        let new_id = self.store.insert(&fork)?;
        tracing::info!(id = %new_id, forked_from = %id, owner = %requester, "template forked");
        Ok(SaveOutcome {
            id: new_id,
            created: true,
        })
    }

    pub fn delete(&self, id: &DocumentId, requester: &UserId) -> WorkspaceResult<()> {
        if self.store.delete_where_owner(id, requester)? == 1 {
            tracing::info!(id = %id, owner = %requester, "template deleted");
            return Ok(());
        }

        // Nothing was removed; re-read only to say why.
        match self.store.get_by_id(id)? {
            None => Err(WorkspaceError::NotFound(id.clone())),
            Some(_) => {
                tracing::warn!(id = %id, requester = %requester, "delete rejected for non-owner");
                Err(WorkspaceError::Forbidden(id.clone()))
            }
        }
    }

    pub fn preview(
        &self,
        id: &DocumentId,
        requester: &UserId,
        context: Option<Context>,
    ) -> WorkspaceResult<String> {
        let document = self.fetch(id, requester)?;
        let context = self.merged_context(context);
        Ok(compile(Some(document.blocks.as_slice()), &context))
    }

    /// Compile a template for `recipient` and hand it to the transport.
    pub fn send(
        &self,
        id: &DocumentId,
        requester: &UserId,
        recipient: &str,
        context: Option<Context>,
    ) -> WorkspaceResult<Delivery> {
        validate_address(recipient).map_err(|e| WorkspaceError::Validation(e.to_string()))?;

        let document = self.fetch(id, requester)?;
        let context = self.merged_context(context);

        let subject = if document.subject.trim().is_empty() {
            FALLBACK_SUBJECT.to_string()
        } else {
            document.subject.clone()
        };

        let mail = OutgoingMail {
            from: self.sender.clone(),
            to: recipient.to_string(),
            subject,
            html: compile(Some(document.blocks.as_slice()), &context),
            text: compile_plain_text(Some(document.blocks.as_slice()), &context),
        };

        let delivery = self.transport.send(&mail).map_err(|err| {
            tracing::warn!(id = %id, to = %recipient, error = %err, "mail transport failed");
            WorkspaceError::from(err)
        })?;

        tracing::info!(id = %id, to = %recipient, message_id = %delivery.message_id, "mail sent");
        Ok(delivery)
    }

    fn visible_record(&self, id: &DocumentId, requester: &UserId) -> WorkspaceResult<DocumentRecord> {
        let record = self
            .store
            .get_by_id(id)?
            .ok_or_else(|| WorkspaceError::NotFound(id.clone()))?;
        if record.visibility == Visibility::Private && &record.owner != requester {
            return Err(WorkspaceError::Forbidden(id.clone()));
        }
        Ok(record)
    }

    fn merged_context(&self, overrides: Option<Context>) -> Context {
        let mut context = self.default_context.clone();
        if let Some(overrides) = overrides {
            context.extend(overrides);
        }
        context
    }
}

fn decode_record(record: DocumentRecord) -> WorkspaceResult<Document> {
    let id = record.id.clone();
    Document::from_record(record).map_err(|source| WorkspaceError::Serialization { id, source })
}
