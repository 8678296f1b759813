#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evergreen_notes::{
    AliasMapMode, BuildContext, FailureMode, NoteIndex, NotesRuntimeConfig,
    resolve_notes_runtime, set_notes_config_override,
};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "evergreen",
    about = "Evergreen notes link-graph CLI: slugs, backlinks, diagnostics, excerpts",
    arg_required_else_help = true
)]
struct Cli {
    /// Project root directory.
    #[arg(
        long,
        short = 'r',
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    root: PathBuf,

    /// Explicit settings file path (overrides `<root>/evergreen.yaml`).
    #[arg(long = "conf", short = 'c', value_name = "FILE", global = true)]
    config_file: Option<PathBuf>,

    /// Notes directory, relative to the project root unless absolute.
    #[arg(long = "notes-dir", value_name = "DIR", global = true)]
    notes_dir: Option<PathBuf>,

    /// Exclude these directory names (repeatable).
    #[arg(long = "exclude-dir", value_name = "DIR", global = true)]
    exclude_dirs: Vec<String>,

    /// Write the diagnostics report to this file after the build.
    #[arg(long, value_name = "FILE", global = true)]
    report: Option<PathBuf>,

    /// Fail when the build has broken links or alias conflicts.
    #[arg(long, default_value_t = false, global = true)]
    strict: bool,

    /// Debug logging on stderr.
    #[arg(long, short = 'v', default_value_t = false, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Json, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full snapshot: manifest, graph, aliases, diagnostics, excerpts.
    Build,
    /// Identity records in enumeration order.
    Manifest,
    /// Outgoing/incoming adjacency.
    Graph,
    /// Alias tables.
    Aliases {
        /// List every name-form in `aliasToSlugs`, not only conflicts.
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Broken links and alias conflicts.
    Diagnostics,
    /// Return link-graph stats.
    Stats,
    /// Resolve a name-form to its canonical slug.
    Resolve { name: String },
    /// Notes linking to a note, sorted by title.
    Backlinks { name: String },
    /// Rendered excerpt of a note.
    Excerpt {
        name: String,
        #[arg(short, long)]
        paragraphs: Option<usize>,
    },
    /// Note identity plus body content.
    Note { name: String },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn emit<T: Serialize>(value: &T, output: OutputFormat) -> Result<()> {
    let rendered = match output {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
    }
    .context("failed to serialize CLI output as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn absolute_root(cli: &Cli) -> PathBuf {
    if cli.root.is_absolute() {
        cli.root.clone()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(&cli.root)
    }
}

fn resolve_config(cli: &Cli, project_root: &Path) -> NotesRuntimeConfig {
    let mut config = resolve_notes_runtime(project_root);
    if let Some(dir) = &cli.notes_dir {
        config.notes_dir = dir.clone();
    }
    if !cli.exclude_dirs.is_empty() {
        config.excluded_dirs = cli.exclude_dirs.clone();
    }
    if let Some(report) = &cli.report {
        config.report_path = Some(report.clone());
    }
    if cli.strict {
        config.failure_mode = FailureMode::Strict;
    }
    config
}

async fn build_index(cli: &Cli) -> Result<Arc<NoteIndex>> {
    let project_root = absolute_root(cli);
    let config = resolve_config(cli, &project_root);
    let notes_root = config.notes_root(&project_root);
    let context = BuildContext::new(notes_root.clone(), config);
    context
        .get_or_build()
        .await
        .with_context(|| format!("failed to build note index for {}", notes_root.display()))
}

fn require_slug<'a>(index: &'a NoteIndex, name: &str) -> Result<&'a str> {
    index
        .resolve(name)
        .with_context(|| format!("no note named '{name}'"))
}

fn execute(cli: &Cli, index: &NoteIndex) -> Result<()> {
    match &cli.command {
        Command::Build => emit(&index.payload(), cli.output),
        Command::Manifest => emit(&index.manifest(), cli.output),
        Command::Graph => emit(index.graph(), cli.output),
        Command::Aliases { all } => {
            let mode = if *all {
                AliasMapMode::All
            } else {
                AliasMapMode::Conflicts
            };
            emit(&index.alias_data(mode), cli.output)
        }
        Command::Diagnostics => emit(index.diagnostics(), cli.output),
        Command::Stats => emit(&index.stats(), cli.output),
        Command::Resolve { name } => emit(
            &json!({
                "name": name,
                "slug": index.resolve(name),
            }),
            cli.output,
        ),
        Command::Backlinks { name } => {
            let slug = require_slug(index, name)?;
            emit(
                &json!({
                    "slug": slug,
                    "backlinks": index.backlinks_for(slug),
                }),
                cli.output,
            )
        }
        Command::Excerpt { name, paragraphs } => {
            let slug = require_slug(index, name)?;
            let html = match paragraphs {
                Some(count) => {
                    let doc = index
                        .note(slug)
                        .with_context(|| format!("note '{slug}' is not indexed"))?;
                    index.render_excerpt(&doc.content, *count)
                }
                None => index.excerpt(slug).unwrap_or_default().to_string(),
            };
            emit(&json!({ "slug": slug, "html": html }), cli.output)
        }
        Command::Note { name } => {
            let slug = require_slug(index, name)?;
            let doc = index
                .note(slug)
                .with_context(|| format!("note '{slug}' is not indexed"))?;
            emit(&doc, cli.output)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "evergreen_notes=debug"
        } else {
            "evergreen_notes=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if let Some(conf) = &cli.config_file {
        set_notes_config_override(conf.clone()).map_err(anyhow::Error::msg)?;
    }

    let index = build_index(&cli).await?;
    execute(&cli, &index)
}
