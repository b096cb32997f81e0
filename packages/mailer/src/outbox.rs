use crate::{validate_address, Delivery, MailTransport, OutgoingMail, TransportError};
use lettre::{FileTransport, Transport};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each message as an `.eml` file into a directory.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
    inner: FileTransport,
}

impl OutboxTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let inner = FileTransport::new(&dir);
        Self { dir, inner }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MailTransport for OutboxTransport {
    fn send(&self, mail: &OutgoingMail) -> Result<Delivery, TransportError> {
        validate_address(&mail.to)?;

        let message_id = mail.new_message_id();
        let message = mail.to_message(&message_id)?;

        fs::create_dir_all(&self.dir)?;
        let file_id = self
            .inner
            .send(&message)
            .map_err(|err| TransportError::Transport {
                message: err.to_string(),
            })?;
        let path = self.dir.join(format!("{}.eml", file_id));

        tracing::info!(to = %mail.to, path = %path.display(), "mail written to outbox");
        Ok(Delivery {
            message_id,
            location: Some(path),
        })
    }
}
