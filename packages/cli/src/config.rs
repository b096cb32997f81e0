use mailforge_mailer::SmtpConfig;
use mailforge_model::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "mailforge.config.json";

/// MailForge project configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Directory containing template files (*.json)
    pub src_dir: String,

    /// Where `compile` writes HTML
    pub out_dir: String,

    /// SQLite database used by `serve`
    pub database: String,

    /// Directory `serve` writes sent mail into
    pub outbox_dir: String,

    /// From address for sent mail
    pub sender: String,

    /// SMTP relay; when unset `serve` falls back to `SMTP_*` variables,
    /// then to the outbox directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,

    pub host: String,
    pub port: u16,

    /// Values layered over the built-in sample context
    pub default_context: Context,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: "templates".to_string(),
            out_dir: "dist".to_string(),
            database: "mailforge.db".to_string(),
            outbox_dir: "outbox".to_string(),
            sender: mailforge_workspace::DEFAULT_SENDER.to_string(),
            smtp: None,
            host: "127.0.0.1".to_string(),
            port: 5000,
            default_context: Context::new(),
        }
    }
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Resolve a configured path against the project directory
    pub fn resolve(&self, cwd: &str, path: &str) -> PathBuf {
        PathBuf::from(cwd).join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailforge_model::Scalar;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "srcDir": "emails",
            "database": "data/mail.db",
            "outboxDir": "sent",
            "sender": "Acme <hi@acme.io>",
            "port": 8080,
            "defaultContext": { "company": "Acme", "year": 2026 }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.src_dir, "emails");
        assert_eq!(config.database, "data/mail.db");
        assert_eq!(config.outbox_dir, "sent");
        assert_eq!(config.port, 8080);
        // Unset fields keep their defaults.
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.out_dir, "dist");
        assert_eq!(config.smtp, None);
        assert_eq!(
            config.default_context.get("company"),
            Some(&Scalar::from("Acme"))
        );
    }

    #[test]
    fn test_parse_smtp_section() {
        let json = r#"{
            "smtp": { "host": "smtp.acme.io", "port": 2525, "username": "mailer", "password": "pw", "tls": "none" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.acme.io");
        assert_eq!(smtp.port(), 2525);
        assert_eq!(smtp.tls, mailforge_mailer::SmtpTls::None);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.src_dir, "templates");
        assert_eq!(config.port, 5000);
        assert!(config.default_context.is_empty());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config, Config::default());
    }
}
