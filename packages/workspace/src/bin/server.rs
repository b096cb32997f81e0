use anyhow::Context as _;
use mailforge_mailer::{MailTransport, OutboxTransport, SmtpMailTransport};
use mailforge_store::{MemoryStore, SqliteStore, TemplateStore};
use mailforge_workspace::{serve, TemplateService, DEFAULT_SENDER};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

struct Options {
    host: String,
    port: u16,
    database: String,
    outbox: PathBuf,
    sender: String,
    smtp: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database: "mailforge.db".to_string(),
            outbox: PathBuf::from("outbox"),
            sender: DEFAULT_SENDER.to_string(),
            smtp: std::env::var_os("SMTP_HOST").is_some(),
        }
    }
}

fn print_help() {
    println!("Usage: mailforge-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -p, --port <PORT>       Port to listen on (default: 5000)");
    println!("  --host <HOST>           Address to bind (default: 127.0.0.1)");
    println!("  --database <PATH>       SQLite database file, or :memory: (default: mailforge.db)");
    println!("  --outbox <DIR>          Directory for sent mail (default: outbox)");
    println!("  --sender <ADDRESS>      From address for sent mail");
    println!("  --smtp                  Deliver through the relay named by SMTP_HOST/SMTP_PORT/SMTP_USER/SMTP_PASSWORD/SMTP_TLS");
    println!("  -h, --help              Show this help message");
}

fn parse_args(args: &[String]) -> anyhow::Result<Option<Options>> {
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            print_help();
            return Ok(None);
        }
        if flag == "--smtp" {
            options.smtp = true;
            i += 1;
            continue;
        }

        let value = args
            .get(i + 1)
            .with_context(|| format!("{} requires a value", flag))?;
        match flag {
            "--port" | "-p" => {
                options.port = value
                    .parse()
                    .with_context(|| format!("Invalid port number: {}", value))?
            }
            "--host" => options.host = value.clone(),
            "--database" => options.database = value.clone(),
            "--outbox" => options.outbox = PathBuf::from(value),
            "--sender" => options.sender = value.clone(),
            other => anyhow::bail!("Unknown argument: {}", other),
        }
        i += 2;
    }

    Ok(Some(options))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args)? else {
        return Ok(());
    };

    let store: Arc<dyn TemplateStore> = if options.database == ":memory:" {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(&options.database)?)
    };
    let transport: Arc<dyn MailTransport> = if options.smtp {
        Arc::new(SmtpMailTransport::from_env()?)
    } else {
        Arc::new(OutboxTransport::new(&options.outbox))
    };
    let service = TemplateService::new(store, transport).with_sender(options.sender);

    let addr: SocketAddr = format!("{}:{}", options.host, options.port)
        .parse()
        .context("Invalid listen address")?;

    println!("Starting MailForge server...");
    println!("Database: {}", options.database);
    if options.smtp {
        println!("Delivery: smtp ($SMTP_HOST)");
    } else {
        println!("Outbox: {}", options.outbox.display());
    }
    println!("HTTP listening on {}", addr);

    serve(service, addr).await
}
