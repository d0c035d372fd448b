//! Reading bug-report directories and writing ranked-result files.
//!
//! Layout: `<root>/<project_id>/<bug_id>/{title.txt, description.txt,
//! <bug_id>*ImageContent.txt}`.

use std::fs;
use std::path::Path;

use crate::corpus::read_text_lossy;
use crate::error::BugLocalizeError;
use crate::model::{BugReport, Corpus};

/// Read one bug report's directory. `raw_text` is `title + "\n" +
/// description`; `extended_text` additionally appends every
/// `<bug_id>*ImageContent.txt` file found, in sorted filename order.
pub fn read_bug_report(bug_dir: &Path, bug_id: &str) -> Result<BugReport, BugLocalizeError> {
    let mut raw_parts = Vec::new();
    for name in ["title.txt", "description.txt"] {
        let path = bug_dir.join(name);
        if path.exists() {
            raw_parts.push(read_text_lossy(&path)?.trim().to_string());
        }
    }
    let raw_text = raw_parts.join("\n").trim().to_string();

    let mut image_files: Vec<_> = fs::read_dir(bug_dir)
        .map_err(|e| BugLocalizeError::IoUnreadable(format!("{}: {}", bug_dir.display(), e)))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("ImageContent.txt"))
        })
        .collect();
    image_files.sort();

    let mut extended_parts = vec![raw_text.clone()];
    for path in image_files {
        extended_parts.push(read_text_lossy(&path)?.trim().to_string());
    }
    let extended_text = extended_parts.join("\n").trim().to_string();

    Ok(BugReport::new(bug_id, raw_text, extended_text))
}

/// Walk `<root>/<project_id>/<bug_id>/` two levels deep and return every
/// `(bug_id, bug_dir)` pair found, in sorted order for determinism. A
/// `bug_id` is any directory containing at least one of `title.txt` or
/// `description.txt`; other entries under a project directory are skipped.
pub fn discover_bug_reports(root: &Path) -> Result<Vec<(String, std::path::PathBuf)>, BugLocalizeError> {
    let mut out = Vec::new();
    let mut project_dirs: Vec<_> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    project_dirs.sort();

    for project_dir in project_dirs {
        let mut bug_dirs: Vec<_> = fs::read_dir(&project_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        bug_dirs.sort();

        for bug_dir in bug_dirs {
            if !bug_dir.join("title.txt").exists() && !bug_dir.join("description.txt").exists() {
                continue;
            }
            let bug_id = bug_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.push((bug_id, bug_dir));
        }
    }

    Ok(out)
}

/// Convert a corpus-relative path (`src/Services/Data.php`) to the dotted
/// ranked-result form (`src.Services.Data.php`), the inverse of
/// [`rank_eval::normalize_file_id`].
pub fn to_dotted_form(path: &str) -> String {
    path.replace('/', ".")
}

/// Write a ranked-result file: one `rank,file_id_in_dotted_form,score` line
/// per result, score formatted to 3 decimals.
pub fn write_ranked_result(
    path: &Path,
    corpus: &Corpus,
    results: &[rank_fusion::RankedResult],
) -> Result<(), BugLocalizeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut lines = Vec::with_capacity(results.len());
    for r in results {
        let file_id = corpus
            .get(r.doc_id)
            .map(|d| to_dotted_form(&d.id))
            .unwrap_or_else(|| r.doc_id.to_string());
        lines.push(format!("{},{},{:.3}", r.rank, file_id, r.score));
    }
    fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        let mut f = fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn reads_title_description_and_image_content() {
        let dir = std::env::temp_dir().join(format!("bug_localize_bugreport_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(&dir.join("title.txt"), "crash on save");
        write_file(&dir.join("description.txt"), "saving a file crashes the app");
        write_file(&dir.join("bug1_screenshotImageContent.txt"), "error dialog text");

        let report = read_bug_report(&dir, "bug1").unwrap();
        assert_eq!(report.raw_text, "crash on save\nsaving a file crashes the app");
        assert!(report.extended_text.contains("error dialog text"));
        assert!(report.extended_text.starts_with(&report.raw_text));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn discover_bug_reports_walks_project_and_bug_directories() {
        let dir = std::env::temp_dir().join(format!("bug_localize_discover_test_{}", std::process::id()));
        let bug_dir = dir.join("project1").join("bug1");
        fs::create_dir_all(&bug_dir).unwrap();
        write_file(&bug_dir.join("title.txt"), "crash");
        fs::create_dir_all(dir.join("project1").join("not_a_bug")).unwrap();

        let found = discover_bug_reports(&dir).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "bug1");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn to_dotted_form_replaces_separators() {
        assert_eq!(to_dotted_form("src/Services/Data.php"), "src.Services.Data.php");
    }

    #[test]
    fn write_ranked_result_formats_score_to_three_decimals() {
        let dir = std::env::temp_dir().join(format!("bug_localize_write_result_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut corpus = Corpus::new();
        corpus.push(crate::model::Document {
            id: "src/Data.php".into(),
            raw_text: String::new(),
            tokens: vec![],
            embedding: vec![],
        });

        let results = vec![rank_fusion::RankedResult { rank: 1, doc_id: 0, score: 0.85555 }];
        let out_path = dir.join("bug1_baseline_basic_query_result.txt");
        write_ranked_result(&out_path, &corpus, &results).unwrap();

        let content = fs::read_to_string(&out_path).unwrap();
        assert_eq!(content.trim(), "1,src.Data.php,0.856");

        fs::remove_dir_all(&dir).ok();
    }
}
