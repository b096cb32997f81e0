use crate::{validate_address, Delivery, MailTransport, OutgoingMail, TransportError};
use std::sync::Mutex;

/// Records messages instead of delivering them.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    failure: Mutex<Option<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later send fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let transport = Self::default();
        transport.set_failure(Some(message.into()));
        transport
    }

    pub fn set_failure(&self, message: Option<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = message;
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> TransportError {
    TransportError::Transport {
        message: "transport state poisoned".to_string(),
    }
}

impl MailTransport for MemoryTransport {
    fn send(&self, mail: &OutgoingMail) -> Result<Delivery, TransportError> {
        validate_address(&mail.to)?;
        // Same checks a real transport makes before handing off.
        mail.to_message(&mail.new_message_id())?;

        let failure = self.failure.lock().map_err(poisoned)?.clone();
        if let Some(message) = failure {
            return Err(TransportError::Transport { message });
        }

        let mut sent = self.sent.lock().map_err(poisoned)?;
        sent.push(mail.clone());

        Ok(Delivery {
            message_id: format!("memory-{}", sent.len()),
            location: None,
        })
    }
}
