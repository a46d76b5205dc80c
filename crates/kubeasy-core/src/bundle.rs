//! Manifest bundle loading and document splitting
//!
//! The bundle is the union of YAML files under a challenge's `manifests/`
//! and `policies/` subtrees. Files are matched on the exact `.yaml`
//! suffix, hidden files are skipped, and the resulting documents keep
//! lexical path order so the author controls apply order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::challenge::{MANIFESTS_DIR, POLICIES_DIR};
use crate::error::Result;

/// One YAML document extracted from a bundle file.
#[derive(Debug, Clone)]
pub struct BundleDocument {
    /// File the document came from, for warnings.
    pub source: PathBuf,
    /// Raw document text, separators stripped.
    pub content: String,
}

/// All documents of a challenge, in apply order.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub documents: Vec<BundleDocument>,
}

impl Bundle {
    /// Load the bundle under a challenge root.
    ///
    /// Missing subdirectories are fine - a challenge without policies is
    /// still a challenge.
    pub fn load(challenge_root: impl AsRef<Path>) -> Result<Self> {
        let root = challenge_root.as_ref();

        let mut files = Vec::new();
        for subdir in [MANIFESTS_DIR, POLICIES_DIR] {
            files.extend(collect_manifest_files(&root.join(subdir))?);
        }
        files.sort();

        let mut documents = Vec::new();
        for file in files {
            let content = std::fs::read_to_string(&file)?;
            for doc in split_documents(&content) {
                documents.push(BundleDocument {
                    source: file.clone(),
                    content: doc,
                });
            }
        }

        Ok(Self { documents })
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Split a YAML stream on `---` separator lines.
///
/// A separator is a line that is exactly `---` followed by nothing but
/// whitespace. Whitespace-only documents are discarded.
pub fn split_documents(stream: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut flush = |lines: &mut Vec<&str>| {
        let doc = lines.join("\n");
        if !doc.trim().is_empty() {
            documents.push(doc);
        }
        lines.clear();
    };

    for line in stream.lines() {
        if is_separator(line) {
            flush(&mut current);
        } else {
            current.push(line);
        }
    }
    flush(&mut current);

    documents
}

fn is_separator(line: &str) -> bool {
    line.strip_prefix("---")
        .is_some_and(|rest| rest.chars().all(char::is_whitespace))
}

/// Collect `.yaml` files under a directory, recursively.
fn collect_manifest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !is_hidden(e.file_name()))
    {
        let entry = entry.map_err(|e| {
            std::io::Error::other(format!("failed to walk {}: {}", dir.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some("yaml") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}
