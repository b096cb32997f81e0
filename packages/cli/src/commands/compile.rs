use crate::config::Config;
use anyhow::{anyhow, Result};
use chrono::{Datelike, Utc};
use clap::Args;
use colored::Colorize;
use mailforge_compiler_html::{compile_plain_text, compile_with_options, CompileOptions};
use mailforge_model::{decode_blocks, defaults, validate_blocks, Block, Context};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Template file or directory (defaults to the configured source directory)
    pub path: Option<String>,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// JSON file with context values
    #[arg(short, long)]
    pub context: Option<String>,

    /// Also write a plain-text version next to each HTML file
    #[arg(long)]
    pub text: bool,

    /// Emit HTML without indentation or newlines
    #[arg(long)]
    pub compact: bool,
}

pub fn compile(args: CompileArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let src = match &args.path {
        Some(path) => config.resolve(cwd, path),
        None => config.resolve(cwd, &config.src_dir),
    };

    if !src.exists() {
        return Err(anyhow!("Source path does not exist: {:?}", src));
    }

    let context = build_context(&config, args.context.as_deref(), cwd)?;

    println!("{}", "🔨 Compiling templates...".bright_blue().bold());

    let (src_dir, files) = if src.is_file() {
        let dir = src.parent().map(Path::to_path_buf).unwrap_or_default();
        (dir, vec![src.clone()])
    } else {
        (src.clone(), find_template_files(&src))
    };

    if files.is_empty() {
        println!("{}", "⚠️  No template files found".yellow());
        return Ok(());
    }

    println!("Found {} files", files.len());

    let out_dir = config.resolve(cwd, args.out_dir.as_deref().unwrap_or(&config.out_dir));
    let mut success_count = 0;
    let mut error_count = 0;

    for file in &files {
        let relative_path = file.strip_prefix(&src_dir).unwrap_or(file);
        match compile_file(file, relative_path, &args, &context, &out_dir) {
            Ok(output_path) => {
                success_count += 1;
                println!(
                    "  {} {} → {}",
                    "✓".green(),
                    relative_path.display(),
                    output_path
                );
            }
            Err(e) => {
                error_count += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    relative_path.display(),
                    e.to_string().red()
                );
            }
        }
    }

    println!();
    if error_count == 0 {
        println!(
            "{} Compiled {} files successfully",
            "✅".green(),
            success_count
        );
        Ok(())
    } else {
        println!(
            "{} Compiled {} files, {} errors",
            "⚠️".yellow(),
            success_count,
            error_count
        );
        Err(anyhow!("{} templates failed to compile", error_count))
    }
}

/// Sample values, then the config's defaults, then the `--context` file.
fn build_context(config: &Config, context_file: Option<&str>, cwd: &str) -> Result<Context> {
    let mut context = defaults::sample_context(Utc::now().year());
    context.extend(config.default_context.clone());

    if let Some(file) = context_file {
        let path = config.resolve(cwd, file);
        let content = fs::read_to_string(&path)
            .map_err(|e| anyhow!("Cannot read context file {:?}: {}", path, e))?;
        let extra: Context = serde_json::from_str(&content)?;
        context.extend(extra);
    }

    Ok(context)
}

fn find_template_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}

/// Blocks from a template file: either a bare block array or an object
/// with a `blocks` (or `sections`) field.
pub(crate) fn read_blocks(source: &str) -> Result<Vec<Block>> {
    let value: Value = serde_json::from_str(source)?;
    let payload = match value {
        Value::Object(mut map) => map
            .remove("blocks")
            .or_else(|| map.remove("sections"))
            .unwrap_or(Value::Null),
        other => other,
    };

    let blocks = decode_blocks(&payload)?;
    validate_blocks(&blocks)?;
    Ok(blocks)
}

fn compile_file(
    file_path: &Path,
    relative_path: &Path,
    args: &CompileArgs,
    context: &Context,
    out_dir: &Path,
) -> Result<String> {
    let source = fs::read_to_string(file_path)?;
    let blocks = read_blocks(&source)?;

    let options = CompileOptions {
        pretty: !args.compact,
        ..CompileOptions::default()
    };
    let html = compile_with_options(Some(blocks.as_slice()), context, options);

    if args.stdout {
        println!("{}", html);
        return Ok("stdout".to_string());
    }

    let output_file = out_dir.join(relative_path).with_extension("html");
    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_file, html)?;

    if args.text {
        let text = compile_plain_text(Some(blocks.as_slice()), context);
        fs::write(output_file.with_extension("txt"), text)?;
    }

    Ok(output_file.display().to_string())
}
