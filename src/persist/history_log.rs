//! Append-only JSONL log of resolved cards.
//!
//! One `{"timestamp": ..., "card": {...}}` object per line, oldest first.
//! Appends open the file each time so a crash loses at most one line.
//! Once the file holds more than `retention` lines it is rewritten with
//! only the newest `retention`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::PersistError;
use crate::pipeline::history::HistoryEntry;

pub struct HistoryLog {
    path: PathBuf,
    retention: usize,
    lines: usize,
}

impl HistoryLog {
    /// Opens (or prepares to create) the log at `path`.
    pub fn open(path: &Path, retention: usize) -> Result<Self, PersistError> {
        let lines = read_raw_lines(path)?.len();

        Ok(Self {
            path: path.to_path_buf(),
            retention: retention.max(1),
            lines,
        })
    }

    /// Reads all parseable entries, oldest first. Bad lines are skipped.
    pub fn load(&self) -> Result<Vec<HistoryEntry>, PersistError> {
        let mut entries = Vec::new();
        for (i, line) in read_raw_lines(&self.path)?.iter().enumerate() {
            match serde_json::from_slice::<HistoryEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::warn!("{}: skipping bad entry {}: {}", self.path.display(), i + 1, e),
            }
        }
        Ok(entries)
    }

    pub fn append(&mut self, entry: &HistoryEntry) -> Result<(), PersistError> {
        let line = serde_json::to_string(entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        self.lines += 1;

        if self.lines > self.retention {
            self.compact()?;
        }
        Ok(())
    }

    /// Rewrites the file keeping the newest `retention` lines.
    fn compact(&mut self) -> Result<(), PersistError> {
        let lines = read_raw_lines(&self.path)?;
        let keep = &lines[lines.len().saturating_sub(self.retention)..];

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        for line in keep {
            temp.write_all(line)?;
            temp.write_all(b"\n")?;
        }
        temp.persist(&self.path).map_err(|e| PersistError::Io(e.error))?;

        self.lines = keep.len();
        Ok(())
    }
}

/// Non-blank lines of `path` as raw bytes; a missing file has none.
fn read_raw_lines(path: &Path) -> Result<Vec<Vec<u8>>, PersistError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut lines = Vec::new();
    for line in BufReader::new(File::open(path)?).split(b'\n') {
        let line = line?;
        if !line.trim_ascii().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::tests::record;
    use crate::lookup::Game;
    use tempfile::tempdir;

    fn entry(name: &str) -> HistoryEntry {
        HistoryEntry::new(record(Game::Magic, name))
    }

    #[test]
    fn test_append_writes_one_line_per_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut log = HistoryLog::open(&path, 10).unwrap();

        log.append(&entry("Black Lotus")).unwrap();
        log.append(&entry("Mox Pearl")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["card"]["name"], "Black Lotus");
        assert_eq!(first["card"]["game"], "magic");
        assert!(first["timestamp"].is_string());
    }

    #[test]
    fn test_compacts_to_retention() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut log = HistoryLog::open(&path, 3).unwrap();

        for i in 0..5 {
            log.append(&entry(&format!("card {}", i))).unwrap();
        }

        let names: Vec<String> = log.load().unwrap().into_iter().map(|e| e.card.name).collect();
        assert_eq!(names, vec!["card 2", "card 3", "card 4"]);
    }

    #[test]
    fn test_reopen_counts_existing_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        {
            let mut log = HistoryLog::open(&path, 2).unwrap();
            log.append(&entry("a")).unwrap();
            log.append(&entry("b")).unwrap();
        }

        let mut log = HistoryLog::open(&path, 2).unwrap();
        log.append(&entry("c")).unwrap();

        let names: Vec<String> = log.load().unwrap().into_iter().map(|e| e.card.name).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_load_skips_bad_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&entry("Pikachu")).unwrap();
        std::fs::write(&path, format!("{{broken\n{}\n\n", good)).unwrap();

        let log = HistoryLog::open(&path, 10).unwrap();
        let entries = log.load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].card.name, "Pikachu");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::open(&dir.path().join("none.jsonl"), 10).unwrap();
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let mut log = HistoryLog::open(&dir.path().join("missing/history.jsonl"), 10).unwrap();
        assert!(matches!(log.append(&entry("x")), Err(PersistError::Io(_))));
    }

    #[test]
    fn test_non_utf8_line_is_skipped_and_compacted_away() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&entry("Pikachu")).unwrap();
        let mut content = format!("{}\n", good).into_bytes();
        content.extend_from_slice(b"\xff\xfe garbage\n");
        content.extend_from_slice(format!("{}\n", good).as_bytes());
        std::fs::write(&path, content).unwrap();

        let mut log = HistoryLog::open(&path, 2).unwrap();
        assert_eq!(log.load().unwrap().len(), 2);

        log.append(&entry("Mew")).unwrap();
        log.append(&entry("Eevee")).unwrap();

        let names: Vec<String> = log.load().unwrap().into_iter().map(|e| e.card.name).collect();
        assert_eq!(names, vec!["Mew", "Eevee"]);
        let raw = std::fs::read(&path).unwrap();
        assert_eq!(raw.iter().filter(|&&b| b == b'\n').count(), 2);
    }
}
