// ABOUTME: App orchestrator: runs CLI subcommands against the locator, identity, revisions, and catalog.
// ABOUTME: Resolves config-driven paths and prints results for the terminal.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use crate::block::{CodeBlock, TextDocument, locate};
use crate::catalog::{DefaultCatalog, JsonCatalog, SoundCatalog, SoundFilter, filter_sounds};
use crate::config::Config;
use crate::host::fenced_note;
use crate::identity::{Identity, decode_share_link};
use crate::revision::{AppendOutcome, JsonFileBackend, RevisionStore};

#[derive(Debug, Subcommand)]
pub enum AppCommand {
    /// Print the fenced block enclosing a line.
    Locate {
        file: PathBuf,
        /// Zero-based cursor line.
        #[arg(short, long)]
        line: usize,
    },
    /// Print the share link for the block enclosing a line.
    Share {
        file: PathBuf,
        #[arg(short, long)]
        line: usize,
    },
    /// Print the code carried by a share link.
    Decode { link: String },
    /// Print a share link as a note body with a fenced block.
    Import { link: String },
    /// Record the block enclosing a line in the document's revision history.
    Save {
        file: PathBuf,
        #[arg(short, long)]
        line: usize,
    },
    /// List the saved revisions of a document as share links.
    Revisions { file: PathBuf },
    /// List sounds from the configured sound map.
    Sounds {
        #[arg(short, long, default_value = "all")]
        filter: String,
        #[arg(short, long, default_value = "")]
        search: String,
    },
}

/// Top-level application.
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self, command: AppCommand) -> anyhow::Result<()> {
        match command {
            AppCommand::Locate { file, line } => {
                let block = locate_in_file(&file, line)?;
                println!(
                    "lines {}-{} ({})",
                    block.start_line,
                    block.end_line,
                    if block.info.is_empty() { "plain" } else { block.info.as_str() }
                );
                println!("{}", block.content);
            }
            AppCommand::Share { file, line } => {
                let block = locate_in_file(&file, line)?;
                let link = Identity::derive(&block.content).share_link(&self.config.share.prefix);
                println!("{}", link);
            }
            AppCommand::Decode { link } => {
                println!("{}", decode_share_link(&self.config.share.prefix, &link)?);
            }
            AppCommand::Import { link } => {
                let code = decode_share_link(&self.config.share.prefix, &link)?;
                print!("{}", fenced_note(&code));
            }
            AppCommand::Save { file, line } => {
                let block = locate_in_file(&file, line)?;
                let store = self.revision_store();
                let outcome = store
                    .append(&document_id(&file)?, &Identity::derive(&block.content))
                    .await?;
                match outcome {
                    AppendOutcome::Added => println!("saved"),
                    AppendOutcome::AlreadyPresent => println!("already saved"),
                }
            }
            AppCommand::Revisions { file } => {
                let store = self.revision_store();
                let revisions = store.list(&document_id(&file)?).await?;
                if revisions.is_empty() {
                    println!("no revisions");
                }
                for identity in revisions {
                    println!("{}", identity.share_link(&self.config.share.prefix));
                }
            }
            AppCommand::Sounds { filter, search } => {
                let filter: SoundFilter = filter.parse()?;
                let entries = match &self.config.catalog.path {
                    Some(path) => JsonCatalog::load(path)
                        .with_context(|| format!("loading sound map {}", path.display()))?
                        .list(),
                    None => DefaultCatalog.list(),
                };
                let shown = filter_sounds(&entries, filter, &search);
                if shown.is_empty() {
                    println!("No sounds found");
                }
                for entry in shown {
                    println!("{:<24} {}", entry.name, entry.category);
                }
            }
        }
        Ok(())
    }

    fn revision_store(&self) -> RevisionStore<JsonFileBackend> {
        RevisionStore::new(JsonFileBackend::new(self.config.revisions_path()))
    }
}

/// Read `file` and locate the non-empty block around `line`.
pub fn locate_in_file(file: &Path, line: usize) -> anyhow::Result<CodeBlock> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    locate(&TextDocument::new(&text), line)
        .filter(|b| !b.content.is_empty())
        .ok_or_else(|| anyhow::anyhow!("No code block found at line {} of {}", line, file.display()))
}

/// Revision histories are keyed by the document's canonical path.
pub fn document_id(file: &Path) -> anyhow::Result<String> {
    let canonical = std::fs::canonicalize(file)
        .with_context(|| format!("resolving {}", file.display()))?;
    Ok(canonical.to_string_lossy().to_string())
}
