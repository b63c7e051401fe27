//! # Query History
//!
//! Append-only log of executed queries, one per line. The REPL loads it
//! read-only to seed the line editor, which offers ghost-text suggestions
//! from it by prefix.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Entries loaded into the line editor at startup
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

pub struct QueryHistory {
    path: PathBuf,
    max_entries: usize,
}

impl QueryHistory {
    pub fn new<P: AsRef<Path>>(path: P, max_entries: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The most recent entries, oldest first
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file '{}'", self.path.display()))?;

        let entries: Vec<String> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        let skip = entries.len().saturating_sub(self.max_entries);
        Ok(entries.into_iter().skip(skip).collect())
    }

    /// Append one executed query. Line breaks become spaces so each entry stays on one line.
    pub fn append(&self, query: &str) -> Result<()> {
        let entry = to_entry(query);
        if entry.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file '{}'", self.path.display()))?;
        writeln!(file, "{entry}")?;
        Ok(())
    }
}

/// Single-line form of a query as stored in the history
pub fn to_entry(query: &str) -> String {
    query.trim().replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_load() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path().join("nested").join("history"), 100);

        history.append("SELECT 1").unwrap();
        history.append("SELECT id\nFROM customer").unwrap();

        assert_eq!(
            history.load().unwrap(),
            vec!["SELECT 1".to_string(), "SELECT id FROM customer".to_string()]
        );
    }

    #[test]
    fn test_to_entry_folds_line_breaks_only() {
        assert_eq!(
            to_entry("SELECT id\r\nFROM customer\nWHERE companyname = 'A  B'\n"),
            "SELECT id  FROM customer WHERE companyname = 'A  B'"
        );
    }

    #[test]
    fn test_load_keeps_most_recent_entries() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path().join("history"), 2);

        for query in ["SELECT 1", "SELECT 2", "SELECT 3"] {
            history.append(query).unwrap();
        }

        assert_eq!(history.load().unwrap(), vec!["SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_append_skips_blank_queries() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path().join("history"), 10);

        history.append("   \n ").unwrap();

        assert!(!history.path().exists());
        assert!(history.load().unwrap().is_empty());
    }
}
