//! Tabular contact import.
//!
//! The import contract is deliberately loose: any field in any column
//! whose trimmed value starts with `@` is a candidate handle, headers or
//! not, ragged rows tolerated. Duplicates collapse to the first
//! occurrence.

use csv::ReaderBuilder;
use std::collections::HashSet;

pub fn handles_from_csv(data: &str) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut seen = HashSet::new();
    let mut handles = Vec::new();
    for record in reader.records().flatten() {
        for field in record.iter() {
            let value = field.trim();
            if value.len() > 1 && value.starts_with('@') && seen.insert(value.to_string()) {
                handles.push(value.to_string());
            }
        }
    }
    handles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_handles_from_any_column() {
        let csv = "name,contact,note\nAli,@ali,friend\n@direct,whatever,@third\n";
        assert_eq!(handles_from_csv(csv), vec!["@ali", "@direct", "@third"]);
    }

    #[test]
    fn test_dedupes_and_skips_non_handles() {
        let csv = "@a,@a,plain\n09123456789,@b,@a\n";
        assert_eq!(handles_from_csv(csv), vec!["@a", "@b"]);
    }

    #[test]
    fn test_ragged_rows_and_whitespace() {
        let csv = "@x\n  @y ,extra,cols,here\n\n";
        assert_eq!(handles_from_csv(csv), vec!["@x", "@y"]);
    }

    #[test]
    fn test_bare_at_is_ignored() {
        assert!(handles_from_csv("@,@\n").is_empty());
        assert!(handles_from_csv("").is_empty());
    }
}
