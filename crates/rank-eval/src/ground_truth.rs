//! Ground-truth loading, file-id normalization, and existence filtering.

use crate::error::EvalError;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Mapping `bug_id -> set of relevant file ids`, in normalized path form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruth {
    entries: HashMap<String, HashSet<String>>,
}

impl GroundTruth {
    pub fn entries(&self) -> &HashMap<String, HashSet<String>> {
        &self.entries
    }

    pub fn get(&self, bug_id: &str) -> Option<&HashSet<String>> {
        self.entries.get(bug_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the line-oriented ground-truth format:
    ///
    /// ```text
    /// <bug_id> <count>
    /// <file_id_1>
    /// ...
    /// <file_id_count>
    /// ```
    ///
    /// repeated for every bug. Blank lines between blocks are skipped.
    /// File ids carry a leading corpus-root segment (e.g.
    /// `tables.src.Services.Data.php` for a corpus rooted at `tables/`);
    /// `corpus_root` supplies that segment so it can be stripped, and the
    /// remainder is normalized with [`normalize_file_id`].
    pub fn load(path: &Path, corpus_root: &Path) -> Result<Self, EvalError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, corpus_root)
    }

    pub fn parse(content: &str, corpus_root: &Path) -> Result<Self, EvalError> {
        let root_prefix = corpus_root.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let lines: Vec<&str> = content.lines().collect();
        let mut entries = HashMap::new();
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].trim();
            if line.is_empty() {
                i += 1;
                continue;
            }
            let mut parts = line.split_whitespace();
            let bug_id = parts
                .next()
                .ok_or_else(|| EvalError::MalformedGroundTruth(line.to_string()))?;
            let count: usize = parts
                .next()
                .ok_or_else(|| EvalError::MalformedGroundTruth(line.to_string()))?
                .parse()
                .map_err(|_| EvalError::MalformedGroundTruth(line.to_string()))?;
            if parts.next().is_some() {
                return Err(EvalError::MalformedGroundTruth(line.to_string()));
            }

            let mut relevant_files = HashSet::new();
            for j in (i + 1)..(i + 1 + count) {
                if j >= lines.len() {
                    break;
                }
                let file_line = lines[j].trim();
                if !file_line.is_empty() {
                    relevant_files.insert(normalize_file_id(file_line, root_prefix));
                }
            }

            entries.insert(bug_id.to_string(), relevant_files);
            i += 1 + count;
        }
        Ok(Self { entries })
    }
}

/// Convert a dotted file id (e.g. `tables.src.Services.Data.php`) into
/// path-separated form (`src/Services/Data.php`), preserving the final
/// extension dot. `root_prefix`, when non-empty, names the leading segment to
/// strip first (the corpus-root directory name); pass `""` for dotted ids
/// that carry no such prefix (e.g. ranked-result files, whose ids are already
/// corpus-relative).
pub fn normalize_file_id(dotted: &str, root_prefix: &str) -> String {
    let path = dotted.trim();
    let without_root = if root_prefix.is_empty() {
        path
    } else {
        path.strip_prefix(root_prefix)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(path)
    };
    match without_root.rsplit_once('.') {
        Some((head, ext)) if !head.is_empty() => {
            format!("{}.{}", head.replace('.', "/"), ext)
        }
        _ => without_root.to_string(),
    }
}

/// The three-way existence partition over a ground truth, per bug: all
/// ground-truth files present in the corpus, some missing, or none missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistenceReport {
    /// `bug_id -> existing relevant files`, restricted to bugs with at least
    /// one existing file. This is the set `Evaluator` scores against.
    pub existing: HashMap<String, HashSet<String>>,
    pub missing: HashMap<String, HashSet<String>>,
    /// Bugs where every ground-truth file is missing from the corpus.
    pub bugs_all_missing: Vec<String>,
    /// Bugs where some, but not all, ground-truth files are missing.
    pub bugs_some_missing: Vec<String>,
}

impl GroundTruth {
    /// Partition ground-truth file ids by whether they exist in the current
    /// corpus, per spec.md §4.7. `exists` should check membership in the
    /// corpus, not the filesystem directly, so corpora loaded from an
    /// arbitrary source (not necessarily a directory walk) can use this too.
    pub fn filter_existing<F>(&self, exists: F) -> ExistenceReport
    where
        F: Fn(&str) -> bool,
    {
        let mut report = ExistenceReport::default();
        for (bug_id, files) in &self.entries {
            let mut existing = HashSet::new();
            let mut missing = HashSet::new();
            for file in files {
                if exists(file) {
                    existing.insert(file.clone());
                } else {
                    missing.insert(file.clone());
                }
            }

            let any_missing = !missing.is_empty();
            if existing.is_empty() && !files.is_empty() {
                report.bugs_all_missing.push(bug_id.clone());
            } else if any_missing {
                report.bugs_some_missing.push(bug_id.clone());
            }

            if !existing.is_empty() {
                report.existing.insert(bug_id.clone(), existing);
            }
            if !missing.is_empty() {
                report.missing.insert(bug_id.clone(), missing);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_file_id_strips_corpus_root_prefix_and_converts_dots() {
        assert_eq!(normalize_file_id("tables.src.Services.Data.php", "tables"), "src/Services/Data.php");
        assert_eq!(normalize_file_id("a.py", ""), "a.py");
    }

    #[test]
    fn normalize_file_id_leaves_unmatched_prefix_alone() {
        assert_eq!(normalize_file_id("other.src.Data.php", "tables"), "other/src/Data.php");
    }

    #[test]
    fn parse_reads_multiple_bug_blocks() {
        let content = "bug1 2\ntables.a.py\ntables.b.py\nbug2 1\ntables.c.py\n";
        let gt = GroundTruth::parse(content, Path::new("tables")).unwrap();
        assert_eq!(gt.len(), 2);
        assert_eq!(gt.get("bug1").unwrap().len(), 2);
        assert!(gt.get("bug1").unwrap().contains("a.py"));
        assert_eq!(gt.get("bug2").unwrap().len(), 1);
    }

    #[test]
    fn parse_skips_blank_lines_between_blocks() {
        let content = "bug1 1\ntables.a.py\n\nbug2 1\ntables.b.py\n";
        let gt = GroundTruth::parse(content, Path::new("tables")).unwrap();
        assert_eq!(gt.len(), 2);
    }

    #[test]
    fn parse_rejects_malformed_header() {
        let content = "bug1 notanumber\ntables.a.py\n";
        assert!(GroundTruth::parse(content, Path::new("tables")).is_err());
    }

    #[test]
    fn filter_existing_partitions_bugs_correctly() {
        let content = "all_missing 1\nmissing.py\nsome_missing 2\npresent.py\nabsent.py\nnone_missing 1\nhere.py\n";
        let gt = GroundTruth::parse(content, Path::new("")).unwrap();

        let exists = |id: &str| id == "present.py" || id == "here.py";
        let report = gt.filter_existing(exists);

        assert_eq!(report.bugs_all_missing, vec!["all_missing".to_string()]);
        assert_eq!(report.bugs_some_missing, vec!["some_missing".to_string()]);
        assert!(!report.existing.contains_key("all_missing"));
        assert_eq!(report.existing.get("some_missing").unwrap().len(), 1);
        assert_eq!(report.existing.get("none_missing").unwrap().len(), 1);
    }
}
