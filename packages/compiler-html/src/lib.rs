//! # MailForge HTML Compiler
//!
//! Turns an ordered block sequence plus a personalization context into a
//! self-contained HTML email.
//!
//! ```text
//! blocks + context
//!        ↓
//! interpolate {{key}} ──→ render_block (one fragment per block)
//!        ↓
//! compile: shell + concatenated fragments
//! ```
//!
//! Every function here is pure and total: unknown block types render to
//! nothing, missing context keys stay as literal `{{key}}`, and an empty
//! block sequence compiles to an empty string.

mod compiler;
mod interpolate;
mod plain_text;
mod render;
mod style;


pub use compiler::{compile, compile_with_options, CompileOptions};
pub use interpolate::interpolate;
pub use plain_text::{compile_plain_text, html_to_text};
pub use render::render_block;
pub use style::{escape_attr, to_css_property, Declarations};
