//! Outgoing mail.
//!
//! [`MailTransport`] hands a rendered message to something that delivers it.
//! Messages are built with lettre. Failures are reported once and never
//! retried here.

mod errors;
mod memory;
mod message;
mod outbox;
mod smtp;

pub use errors::TransportError;
pub use memory::MemoryTransport;
pub use message::{validate_address, Delivery, OutgoingMail};
pub use outbox::OutboxTransport;
pub use smtp::{SmtpConfig, SmtpMailTransport, SmtpTls};

pub trait MailTransport: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> Result<Delivery, TransportError>;
}
