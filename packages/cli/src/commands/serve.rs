use crate::config::Config;
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use mailforge_mailer::{MailTransport, OutboxTransport, SmtpConfig, SmtpMailTransport};
use mailforge_store::SqliteStore;
use mailforge_workspace::{serve as serve_api, TemplateService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

pub fn serve(args: ServeArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let host = args.host.unwrap_or_else(|| config.host.clone());
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let database = config.resolve(cwd, &config.database);
    let outbox = config.resolve(cwd, &config.outbox_dir);

    let store = Arc::new(SqliteStore::open(&database)?);
    let (transport, delivery) = transport(&config, outbox)?;
    let service = TemplateService::new(store, transport)
        .with_sender(config.sender.clone())
        .with_default_context(config.default_context.clone());

    println!("{}", "📬 Starting MailForge server...".bright_blue().bold());
    println!("  Database: {}", database.display());
    println!("  Delivery: {}", delivery);
    println!("  Listening on {}", format!("http://{}", addr).cyan());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve_api(service, addr))
}

/// Configured relay first, then `SMTP_HOST` from the environment, then the
/// outbox directory.
fn transport(config: &Config, outbox: PathBuf) -> Result<(Arc<dyn MailTransport>, String)> {
    let smtp = match &config.smtp {
        Some(smtp) => Some(smtp.clone()),
        None if std::env::var_os("SMTP_HOST").is_some() => Some(SmtpConfig::from_env()?),
        None => None,
    };

    match smtp {
        Some(smtp) => {
            let transport = SmtpMailTransport::new(&smtp)?;
            Ok((Arc::new(transport), format!("smtp://{}:{}", smtp.host, smtp.port())))
        }
        None => {
            let label = outbox.display().to_string();
            Ok((Arc::new(OutboxTransport::new(outbox)), label))
        }
    }
}
