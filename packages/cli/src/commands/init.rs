use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mailforge_model::{defaults, Visibility};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Template directory
    #[arg(short, long, default_value = "templates")]
    pub src_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing MailForge project...".bright_blue().bold());

    let src_dir = PathBuf::from(cwd).join(&args.src_dir);
    if !src_dir.exists() {
        fs::create_dir_all(&src_dir)?;
        println!("  {} Created {}/", "✓".green(), args.src_dir);
    }

    // Starter template built from the palette defaults
    let example_file = src_dir.join("welcome.json");
    if !example_file.exists() {
        let starter = json!({
            "name": "Welcome",
            "category": "Onboarding",
            "subject": "Welcome to {{company}}",
            "visibility": Visibility::Private,
            "blocks": defaults::default_blocks(),
        });
        fs::write(&example_file, serde_json::to_string_pretty(&starter)?)?;
        println!("  {} Created welcome.json", "✓".green());
    }

    let config = Config {
        src_dir: args.src_dir.clone(),
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/welcome.json", args.src_dir);
    println!("  2. Run: mailforge compile");
    println!("  3. Check output in {}/", config.out_dir);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailforge_model::{decode_blocks, validate_blocks};
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_config_and_starter() {
        let dir = TempDir::new().unwrap();
        let cwd = dir.path().display().to_string();

        init(
            InitArgs {
                src_dir: "emails".to_string(),
                force: false,
            },
            &cwd,
        )
        .unwrap();

        let config = Config::load(&cwd).unwrap();
        assert_eq!(config.src_dir, "emails");

        let starter: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("emails/welcome.json")).unwrap(),
        )
        .unwrap();
        let blocks = decode_blocks(&starter["blocks"]).unwrap();
        validate_blocks(&blocks).unwrap();
        assert_eq!(blocks.len(), 4);
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = TempDir::new().unwrap();
        let cwd = dir.path().display().to_string();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "port": 9000 }"#).unwrap();

        init(
            InitArgs {
                src_dir: "templates".to_string(),
                force: false,
            },
            &cwd,
        )
        .unwrap();

        assert_eq!(Config::load(&cwd).unwrap().port, 9000);
        assert!(!dir.path().join("templates").exists());
    }
}
