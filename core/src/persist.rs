//! The serialized index artifact: the sole contract between the batch
//! indexing job and the serving process. Publication is atomic (write to a
//! temp file, rename over the live one) so readers only ever observe a
//! complete artifact.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, rename, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{compute_idf, ArticleRecord, DocId, Posting, SearchIndex};

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub file_count: usize,
    pub doc_count: usize,
    pub token_count: usize,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub version: u32,
    pub sources: Vec<String>,
    pub docs: Vec<ArticleRecord>,
    pub inverted: HashMap<String, Vec<(DocId, u32)>>,
    pub meta: ArtifactMeta,
}

impl IndexArtifact {
    pub fn from_index(index: &SearchIndex, file_count: usize, created_at: String) -> Self {
        let inverted: HashMap<String, Vec<(DocId, u32)>> = index
            .postings
            .iter()
            .map(|(t, plist)| (t.clone(), plist.iter().map(|p| (p.doc_id, p.tf)).collect()))
            .collect();
        Self {
            version: ARTIFACT_VERSION,
            sources: index.sources.clone(),
            docs: index.docs.clone(),
            meta: ArtifactMeta {
                file_count,
                doc_count: index.docs.len(),
                token_count: inverted.len(),
                created_at,
            },
            inverted,
        }
    }

    /// Rebuild the in-memory index. The IDF table is derived data and is
    /// recomputed from the persisted document frequencies.
    pub fn into_index(self) -> SearchIndex {
        let postings: HashMap<String, Vec<Posting>> = self
            .inverted
            .into_iter()
            .map(|(t, plist)| {
                (t, plist.into_iter().map(|(doc_id, tf)| Posting { doc_id, tf }).collect())
            })
            .collect();
        let idf = compute_idf(self.docs.len(), &postings);
        SearchIndex {
            sources: self.sources,
            docs: self.docs,
            postings,
            idf,
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn artifact(&self) -> PathBuf {
        self.root.join("index.bin")
    }
    fn artifact_tmp(&self) -> PathBuf {
        self.root.join("index.bin.tmp")
    }
    pub fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
    pub fn labels(&self) -> PathBuf {
        self.root.join("labels.json")
    }
}

/// Persist the artifact. The previous artifact stays live until the rename,
/// so a failed build leaves it untouched.
pub fn save_artifact(paths: &IndexPaths, artifact: &IndexArtifact) -> Result<()> {
    create_dir_all(&paths.root)?;
    let tmp = paths.artifact_tmp();
    {
        let mut w = BufWriter::new(File::create(&tmp)?);
        bincode::serialize_into(&mut w, artifact)?;
        w.flush()?;
    }
    rename(&tmp, paths.artifact())?;
    let mut f = File::create(paths.meta())?;
    f.write_all(serde_json::to_string_pretty(&artifact.meta)?.as_bytes())?;
    Ok(())
}

pub fn load_artifact(paths: &IndexPaths) -> Result<IndexArtifact> {
    let f = File::open(paths.artifact())
        .with_context(|| format!("open index artifact {}", paths.artifact().display()))?;
    let artifact: IndexArtifact = bincode::deserialize_from(BufReader::new(f))?;
    if artifact.version != ARTIFACT_VERSION {
        bail!(
            "unsupported index artifact version {} (expected {})",
            artifact.version,
            ARTIFACT_VERSION
        );
    }
    Ok(artifact)
}

pub fn load_index(paths: &IndexPaths) -> Result<SearchIndex> {
    Ok(load_artifact(paths)?.into_index())
}

/// Optional `labels.json` next to the artifact: source key -> display name.
pub fn load_labels(paths: &IndexPaths) -> Result<HashMap<String, String>> {
    if !paths.labels().exists() {
        return Ok(HashMap::new());
    }
    let f = File::open(paths.labels())?;
    Ok(serde_json::from_reader(BufReader::new(f))?)
}
