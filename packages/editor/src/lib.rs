//! # MailForge Editor
//!
//! Editing engine for block-based email templates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editing surface: clicks, drags, inputs      │
//! └─────────────────────────────────────────────┘
//!                     ↓ Mutation
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - Validate + apply mutations               │
//! │  - Selection, dirty flag, version           │
//! │  - Produce the save patch                   │
//! │  - Adopt the fork after a non-owner save    │
//! └─────────────────────────────────────────────┘
//!                     ↓ DocumentPatch
//! ┌─────────────────────────────────────────────┐
//! │ workspace: ownership & fork resolution      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The session is an explicit value owned by the caller. Nothing in this
//! crate keeps state between calls.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mailforge_editor::{EditSession, Mutation};
//! use mailforge_model::BlockKind;
//!
//! let mut session = EditSession::new("tab-1", document);
//! let result = session.apply(Mutation::AddBlock { kind: BlockKind::Button, index: Some(1) })?;
//! let html = session.preview(&context);
//! let patch = session.to_patch()?;
//! ```

mod errors;
mod mutations;
mod session;

pub use errors::EditorError;
pub use mutations::{Mutation, MutationError, MutationResult};
pub use session::EditSession;
