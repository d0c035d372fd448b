//! Walking a source tree into a [`Corpus`] of normalized, embedded documents.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::collaborators::Embedder;
use crate::error::BugLocalizeError;
use crate::model::{Corpus, Document};
use crate::text::{normalize, tokenize};

/// Read a file as UTF-8, falling back to a lossy Latin-1 decode if it isn't
/// valid UTF-8, matching spec.md §6's "UTF-8 with Latin-1 fallback" policy.
pub fn read_text_lossy(path: &Path) -> Result<String, BugLocalizeError> {
    let bytes = fs::read(path).map_err(|e| BugLocalizeError::IoUnreadable(format!("{}: {}", path.display(), e)))?;
    match String::from_utf8(bytes.clone()) {
        Ok(s) => Ok(s),
        Err(_) => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn walk(root: &Path, extensions: &HashSet<String>, out: &mut Vec<std::path::PathBuf>) -> Result<(), BugLocalizeError> {
    let read_dir = fs::read_dir(root).map_err(|e| BugLocalizeError::IoUnreadable(format!("{}: {}", root.display(), e)))?;
    let mut entries: Vec<_> = read_dir
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, extensions, out)?;
        } else if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if extensions.contains(ext) {
                out.push(path);
            }
        }
    }
    Ok(())
}

/// Walk `root` collecting files matching `extensions`, normalize each with
/// `stopwords`, embed each with `embedder`, and assign corpus positions in
/// sorted-path order so the build is deterministic.
///
/// # Errors
///
/// Returns `BugLocalizeError::CorpusEmpty` if no matching files are found.
pub fn build_corpus(
    root: &Path,
    extensions: &HashSet<String>,
    stopwords: &HashSet<String>,
    embedder: &dyn Embedder,
) -> Result<Corpus, BugLocalizeError> {
    let mut paths = Vec::new();
    walk(root, extensions, &mut paths)?;

    if paths.is_empty() {
        return Err(BugLocalizeError::CorpusEmpty(format!(
            "no files matching {:?} found under {}",
            extensions,
            root.display()
        )));
    }

    let mut corpus = Corpus::new();
    for path in paths {
        let raw_text = read_text_lossy(&path)?;
        let normalized = normalize(&raw_text, stopwords);
        let tokens = tokenize(&normalized);
        let embedding = embedder.embed(&normalized)?;
        let id = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");

        corpus.push(Document { id, raw_text, tokens, embedding });
    }

    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NullEmbedder;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        let mut f = fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn build_corpus_indexes_matching_extensions_only() {
        let dir = std::env::temp_dir().join(format!("bug_localize_corpus_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(&dir.join("a.py"), "def connect(): pass");
        write_file(&dir.join("notes.txt"), "not indexed");

        let extensions: HashSet<String> = ["py".to_string()].into_iter().collect();
        let stopwords = HashSet::new();
        let embedder = NullEmbedder::new(4);

        let corpus = build_corpus(&dir, &extensions, &stopwords, &embedder).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(0).unwrap().id, "a.py");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn build_corpus_rejects_empty_directory() {
        let dir = std::env::temp_dir().join(format!("bug_localize_empty_corpus_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let extensions: HashSet<String> = ["py".to_string()].into_iter().collect();
        let stopwords = HashSet::new();
        let embedder = NullEmbedder::new(4);

        let err = build_corpus(&dir, &extensions, &stopwords, &embedder).unwrap_err();
        assert!(matches!(err, BugLocalizeError::CorpusEmpty(_)));

        fs::remove_dir_all(&dir).ok();
    }
}
