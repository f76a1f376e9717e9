use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modda_core::persist::{save_artifact, IndexArtifact, IndexPaths};
use modda_core::segment::{segment, SegmentConfig};
use modda_core::IndexBuilder;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modda-indexer")]
#[command(about = "Build the statute clause index from plaintext sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of .txt statute files
    /// (one file per source category, key = file stem)
    Build {
        /// Input directory
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Minimum clause body length kept, in chars
        #[arg(long, default_value_t = 40)]
        min_article_len: usize,
        /// Minimum fallback chunk length kept, in chars
        #[arg(long, default_value_t = 80)]
        min_chunk_len: usize,
        /// Target chunk size for documents without detectable clauses, in chars
        #[arg(long, default_value_t = 2000)]
        chunk_target: usize,
        /// JSON file mapping source keys to display labels, published next
        /// to the artifact for the serving layer
        #[arg(long)]
        labels: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, min_article_len, min_chunk_len, chunk_target, labels } => {
            let cfg = SegmentConfig { min_article_len, min_chunk_len, chunk_target };
            build(&input, &output, &cfg, labels.as_deref())
        }
    }
}

fn build(input: &str, output: &str, cfg: &SegmentConfig, labels: Option<&str>) -> Result<()> {
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let mut builder = IndexBuilder::new();
    let mut file_count = 0usize;
    for file in &files {
        let source = match file.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_lowercase(),
            None => {
                tracing::warn!(file = %file.display(), "skipping file with unusable name");
                continue;
            }
        };
        // A broken or missing file costs one source, not the whole batch.
        let bytes = match fs::read(file) {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(file = %file.display(), %err, "skipping unreadable source file");
                continue;
            }
        };
        // Legacy encodings degrade to replacement characters, never errors.
        let text = String::from_utf8_lossy(&bytes);
        let records = segment(&source, &text, cfg);
        if records.is_empty() {
            tracing::warn!(%source, "source produced no records");
        } else {
            tracing::info!(%source, records = records.len(), "segmented source");
        }
        builder.add_records(records);
        file_count += 1;
    }

    let index = builder.finish();
    tracing::info!(
        files = file_count,
        docs = index.docs.len(),
        tokens = index.postings.len(),
        "index built"
    );

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let artifact = IndexArtifact::from_index(&index, file_count, created_at);
    let paths = IndexPaths::new(output);
    save_artifact(&paths, &artifact)?;

    if let Some(labels_path) = labels {
        let raw = fs::read_to_string(labels_path)
            .with_context(|| format!("read labels file {labels_path}"))?;
        let parsed: HashMap<String, String> =
            serde_json::from_str(&raw).context("labels file must map source keys to display names")?;
        fs::write(paths.labels(), serde_json::to_string_pretty(&parsed)?)?;
    }

    tracing::info!(output, "index build complete");
    Ok(())
}
