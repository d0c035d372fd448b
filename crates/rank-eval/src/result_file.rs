//! Reading persisted ranked-result files.
//!
//! Format: one result per line, `rank,file_id_in_dotted_form,score`. A
//! missing file is not a read error — per spec.md §7 the evaluator treats a
//! per-bug-variant failure to produce a result file as an empty ranking.

use crate::ground_truth::normalize_file_id;
use std::path::Path;

/// Load a ranked-result file and return the normalized file ids in rank
/// order. Returns an empty vector, not an error, if `path` does not exist.
pub fn load_ranked_result(path: &Path) -> std::io::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_ranked_result(&content))
}

/// Parse the in-memory contents of a ranked-result file.
pub fn parse_ranked_result(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let mut fields = line.splitn(3, ',');
            let _rank = fields.next()?;
            let file_id = fields.next()?.trim();
            Some(normalize_file_id(file_id, ""))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ranked_result_normalizes_dotted_ids_in_order() {
        let content = "1,src.Services.Data.php,0.856\n2,src.Template.Builder.php,0.743\n";
        let parsed = parse_ranked_result(content);
        assert_eq!(parsed, vec!["src/Services/Data.php", "src/Template/Builder.php"]);
    }

    #[test]
    fn parse_ranked_result_skips_blank_lines() {
        let content = "1,a.py,0.500\n\n2,b.py,0.100\n";
        assert_eq!(parse_ranked_result(content), vec!["a.py", "b.py"]);
    }

    #[test]
    fn load_missing_file_is_empty_not_an_error() {
        let result = load_ranked_result(Path::new("/nonexistent/path/does/not/exist.txt")).unwrap();
        assert!(result.is_empty());
    }
}
