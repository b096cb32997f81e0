//! # MailForge Model
//!
//! Data types shared by every MailForge crate: the block-based email
//! template document, its Style Maps, patches and the persisted record form.
//!
//! ```text
//! Document
//!  ├─ metadata (name, category, subject, owner, visibility, forkedFrom)
//!  └─ blocks: [Block]
//!       ├─ id
//!       ├─ content: Header | Text | Image | Button | Spacer | Footer
//!       └─ style: StyleMap (ordered key → Scalar)
//! ```

mod block;
pub mod defaults;
mod document;
mod errors;
mod ids;
mod scalar;

pub use block::{
    decode_blocks, new_block_id, validate_blocks, Block, BlockContent, BlockKind, ButtonData,
    FooterData, HeaderData, ImageData, TextData,
};
pub use document::{
    Document, DocumentPatch, DocumentRecord, DocumentSummary, FieldUpdate, NewDocument,
    SaveOutcome, Visibility,
};
pub use errors::ModelError;
pub use ids::{DocumentId, UserId};
pub use scalar::{Context, Scalar, StyleMap};
