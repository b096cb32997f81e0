use mailforge_mailer::TransportError;
use mailforge_model::{DocumentId, ModelError};
use mailforge_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("template not found: {0}")]
    NotFound(DocumentId),

    #[error("not allowed to modify template {0}")]
    Forbidden(DocumentId),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("stored template {id} is unreadable: {source}")]
    Serialization {
        id: DocumentId,
        #[source]
        source: ModelError,
    },

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for WorkspaceError {
    /// Model errors raised while decoding caller input.
    fn from(err: ModelError) -> Self {
        WorkspaceError::Validation(err.to_string())
    }
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
