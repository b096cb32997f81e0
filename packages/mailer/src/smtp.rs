use crate::{validate_address, Delivery, MailTransport, OutgoingMail, TransportError};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

impl SmtpTls {
    pub fn default_port(self) -> u16 {
        match self {
            SmtpTls::StartTls => 587,
            SmtpTls::Tls => 465,
            SmtpTls::None => 25,
        }
    }
}

impl FromStr for SmtpTls {
    type Err = TransportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "starttls" => Ok(SmtpTls::StartTls),
            "tls" => Ok(SmtpTls::Tls),
            "none" => Ok(SmtpTls::None),
            other => Err(TransportError::MissingConfig(format!(
                "SMTP_TLS must be starttls, tls or none (got {:?})",
                other
            ))),
        }
    }
}

/// Relay settings, from the `smtp` config section or `SMTP_*` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: SmtpTls,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: None,
            tls: SmtpTls::default(),
        }
    }

    /// Reads `SMTP_HOST` (required), `SMTP_PORT`, `SMTP_USER`,
    /// `SMTP_PASSWORD` and `SMTP_TLS`.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TransportError> {
        let host = lookup("SMTP_HOST")
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| TransportError::MissingConfig("SMTP_HOST".to_string()))?;

        let port = match lookup("SMTP_PORT") {
            Some(port) => Some(port.trim().parse::<u16>().map_err(|_| {
                TransportError::MissingConfig(format!("SMTP_PORT is not a port: {:?}", port))
            })?),
            None => None,
        };

        let tls = match lookup("SMTP_TLS") {
            Some(tls) => tls.parse()?,
            None => SmtpTls::default(),
        };

        Ok(Self {
            host,
            port,
            username: lookup("SMTP_USER"),
            password: lookup("SMTP_PASSWORD"),
            tls,
        })
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.tls.default_port())
    }
}

fn smtp_error(err: lettre::transport::smtp::Error) -> TransportError {
    TransportError::Transport {
        message: err.to_string(),
    }
}

/// Delivers through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailTransport {
    host: String,
    inner: SmtpTransport,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, TransportError> {
        let builder = match config.tls {
            SmtpTls::StartTls => SmtpTransport::starttls_relay(&config.host).map_err(smtp_error)?,
            SmtpTls::Tls => SmtpTransport::relay(&config.host).map_err(smtp_error)?,
            SmtpTls::None => SmtpTransport::builder_dangerous(&config.host),
        };

        let mut builder = builder
            .port(config.port())
            .timeout(Some(SEND_TIMEOUT));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::debug!(host = %config.host, port = config.port(), tls = ?config.tls, "smtp relay configured");
        Ok(Self {
            host: config.host.clone(),
            inner: builder.build(),
        })
    }

    pub fn from_env() -> Result<Self, TransportError> {
        Self::new(&SmtpConfig::from_env()?)
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl MailTransport for SmtpMailTransport {
    fn send(&self, mail: &OutgoingMail) -> Result<Delivery, TransportError> {
        validate_address(&mail.to)?;

        let message_id = mail.new_message_id();
        let message = mail.to_message(&message_id)?;

        let response = self.inner.send(&message).map_err(|err| {
            tracing::warn!(to = %mail.to, host = %self.host, error = %err, "smtp send failed");
            smtp_error(err)
        })?;

        tracing::info!(to = %mail.to, host = %self.host, code = %response.code(), "mail sent");
        Ok(Delivery {
            message_id,
            location: None,
        })
    }
}
