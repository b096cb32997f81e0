use crate::TransportError;
use lettre::message::{Mailbox, MultiPart};
use lettre::{Address, Message};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

/// A fully rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Result of a successful hand-off.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

/// Check that `address` is a bare `local@domain` mail address.
pub fn validate_address(address: &str) -> Result<(), TransportError> {
    address
        .parse::<Address>()
        .map(|_| ())
        .map_err(|_| TransportError::InvalidAddress(address.to_string()))
}

fn mailbox(value: &str) -> Result<Mailbox, TransportError> {
    value
        .parse::<Mailbox>()
        .map_err(|_| TransportError::InvalidAddress(value.to_string()))
}

impl OutgoingMail {
    /// Fresh `local@domain` message id, using the sender's domain.
    pub fn new_message_id(&self) -> String {
        let domain = self
            .from
            .parse::<Mailbox>()
            .map(|mailbox| mailbox.email.domain().to_string())
            .unwrap_or_else(|_| "mailforge.local".to_string());
        format!("{}@{}", Uuid::new_v4().simple(), domain)
    }

    /// Build a `multipart/alternative` message: text part first, html part
    /// second, so clients prefer the html part.
    pub fn to_message(&self, message_id: &str) -> Result<Message, TransportError> {
        let subject: String = self
            .subject
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();

        Message::builder()
            .from(mailbox(&self.from)?)
            .to(mailbox(&self.to)?)
            .subject(subject)
            .message_id(Some(format!("<{}>", message_id)))
            .date_now()
            .multipart(MultiPart::alternative_plain_html(
                self.text.clone(),
                self.html.clone(),
            ))
            .map_err(|err| TransportError::Transport {
                message: err.to_string(),
            })
    }
}
