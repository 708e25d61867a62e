//! CLI entry point.
//!
//! Walks a directory for template files, infers a type for each, and writes
//! a generated TypeScript module next to each template. A file that fails to
//! parse or type-check is logged and skipped; the rest of the run continues.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use typestache::codegen::generate_module;
use typestache::files::find_template_files;

#[derive(Debug, Parser)]
#[command(
    name = "typestache",
    version,
    about = "Generate TypeScript types from mustache templates"
)]
struct Args {
    /// Directory to process.
    directory: PathBuf,

    /// Show what would be done without making changes.
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Template file suffix to look for.
    #[arg(long, default_value = ".mustache")]
    suffix: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !args.directory.exists() {
        bail!("Directory {} does not exist.", args.directory.display());
    }
    if !args.directory.is_dir() {
        bail!("{} is not a directory.", args.directory.display());
    }

    if args.verbose {
        println!("==========================");
        println!("Directory name: {}", args.directory.display().yellow());
        println!(
            "Absolute path:  {}",
            fs::canonicalize(&args.directory)?.display()
        );
        println!("==========================\n");
    }

    let template_files = find_template_files(&args.directory, &args.suffix)
        .with_context(|| format!("failed to scan {}", args.directory.display()))?;

    for template_file in template_files {
        if args.verbose {
            println!("{} {}", "PROCESSING".yellow(), template_file.display());
        }
        let contents = fs::read_to_string(&template_file)
            .with_context(|| format!("failed to read {}", template_file.display()))?;

        let tags = match typestache::parse(&contents) {
            Ok(tags) => tags,
            Err(err) => {
                warn!("couldn't parse {}: {}", template_file.display(), err);
                continue;
            }
        };

        let source = template_file.display().to_string();
        let module = match generate_module(&source, &contents, &tags) {
            Ok(module) => module,
            Err(err) => {
                warn!(
                    "couldn't infer a type for {}: {}",
                    template_file.display(),
                    err
                );
                continue;
            }
        };

        let out_path = output_path(&template_file, &args.suffix);
        if args.dry_run {
            println!("[DRY RUN] Would write to: {}", out_path.display());
        } else {
            fs::write(&out_path, module)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            if args.verbose {
                println!(
                    "{} {}",
                    "WROTE     ".yellow(),
                    out_path.display().green()
                );
            }
        }
    }

    Ok(())
}

/// The generated module path: the template path with its suffix replaced by
/// `.ts`.
fn output_path(template_file: &Path, suffix: &str) -> PathBuf {
    let name = template_file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(suffix).unwrap_or(name);
    template_file.with_file_name(format!("{stem}.ts"))
}
