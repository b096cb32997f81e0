pub mod errors;
pub mod server;
pub mod service;

pub use errors::{WorkspaceError, WorkspaceResult};
pub use server::{router, serve, Requester, USER_HEADER};
pub use service::{TemplateService, DEFAULT_SENDER, FALLBACK_SUBJECT};
