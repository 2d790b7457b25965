use std::{
    collections::{HashSet, VecDeque},
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::Result;

/// Deduplicated, bounded command log persisted one command per line.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    max_size: usize,
    entries: VecDeque<String>,
    seen: HashSet<String>,
}

impl HistoryStore {
    /// Open the store at `path`, creating its parent directory and loading
    /// any existing entries.
    pub fn open(path: impl Into<PathBuf>, max_size: usize) -> Result<Self> {
        let mut store = Self {
            path: path.into(),
            max_size,
            entries: VecDeque::new(),
            seen: HashSet::new(),
        };
        ensure_parent(&store.path)?;
        store.load()?;
        Ok(store)
    }

    pub fn load(&mut self) -> Result<()> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        self.entries.clear();
        self.seen.clear();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                self.add(line);
            }
        }

        debug!(path = %self.path.display(), entries = self.entries.len(), "history loaded");
        Ok(())
    }

    /// Append `command` unless it is empty or already stored. The oldest entry
    /// is evicted once the store grows past its maximum size.
    pub fn add(&mut self, command: &str) {
        if command.is_empty() || self.seen.contains(command) {
            return;
        }

        self.entries.push_back(command.to_string());
        self.seen.insert(command.to_string());

        while self.entries.len() > self.max_size {
            if let Some(oldest) = self.entries.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }

    /// Snapshot of all commands, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn save(&self) -> Result<()> {
        ensure_parent(&self.path)?;
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for entry in &self.entries {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "history saved");
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(max: usize) -> (HistoryStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::open(tmp.path().join("nested").join("history"), max).unwrap();
        (store, tmp)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (store, tmp) = store(10);
        assert!(store.entries().is_empty());
        assert!(tmp.path().join("nested").is_dir());
    }

    #[test]
    fn test_add_skips_empty_and_duplicates() {
        let (mut store, _tmp) = store(10);
        store.add("git status");
        store.add("");
        store.add("ls");
        store.add("git status");

        assert_eq!(store.entries(), vec!["git status", "ls"]);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let (mut store, _tmp) = store(3);
        for cmd in ["a", "b", "c", "d", "e"] {
            store.add(cmd);
        }
        assert_eq!(store.entries(), vec!["c", "d", "e"]);

        // an evicted command may come back
        store.add("a");
        assert_eq!(store.entries(), vec!["d", "e", "a"]);
    }

    #[test]
    fn test_entries_stay_unique_and_bounded() {
        let (mut store, _tmp) = store(5);
        for i in 0..200 {
            store.add(&format!("cmd {}", (i * 7) % 13));
            let entries = store.entries();
            let unique: HashSet<_> = entries.iter().collect();
            assert_eq!(unique.len(), entries.len());
            assert!(entries.len() <= 5);
        }
    }

    #[test]
    fn test_save_and_reload() {
        let (mut store, tmp) = store(10);
        store.add("echo one");
        store.add("echo two");
        store.save().unwrap();

        let path = tmp.path().join("nested").join("history");
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo one\necho two\n");

        let reloaded = HistoryStore::open(&path, 10).unwrap();
        assert_eq!(reloaded.entries(), vec!["echo one", "echo two"]);
    }

    #[test]
    fn test_load_applies_bound_and_dedup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("history");
        fs::write(&path, "a\nb\n\na\nc\nd\n").unwrap();

        let store = HistoryStore::open(&path, 2).unwrap();
        assert_eq!(store.entries(), vec!["c", "d"]);
    }
}
