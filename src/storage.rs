//! Progress storage: where serialized agent state lives between runs.
//!
//! Layout of a `FileStore` directory:
//!
//! ```text
//! current_state.json
//! history/<id>.json          one per save, oldest removed by clean_history
//! backups/backup_<id>.json
//! ```
//!
//! Ids are `<unix millis>_<sequence>`, so sorting them sorts by time.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{OfcError, OfcResult};

const CURRENT_FILE: &str = "current_state.json";
const HISTORY_DIR: &str = "history";
const BACKUP_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "backup_";

/// Default number of entries `history` returns.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
/// Default number of history snapshots `clean_history` keeps.
pub const DEFAULT_KEEP_LAST: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub bytes: usize,
}

impl HistoryEntry {
    /// Milliseconds since the epoch encoded in the id, if it has one.
    pub fn saved_at_millis(&self) -> Option<u64> {
        self.id.split('_').next()?.parse().ok()
    }
}

/// Somewhere to keep the agent's JSON between runs. Implementations decide
/// durability; callers treat every method as fallible.
pub trait ProgressStore: Send + Sync {
    /// Replace the current blob and record a history snapshot.
    fn save(&self, blob: &str) -> OfcResult<()>;
    /// Current blob, `None` if nothing was ever saved.
    fn load(&self) -> OfcResult<Option<String>>;
    /// Newest history snapshots first, at most `limit`.
    fn history(&self, limit: usize) -> OfcResult<Vec<HistoryEntry>>;
    /// Copy the current blob to a backup. Returns the backup id, or `None`
    /// when there is nothing to back up.
    fn backup(&self) -> OfcResult<Option<String>>;
    /// Make backup `id` the current blob.
    fn restore(&self, id: &str) -> OfcResult<()>;
    /// Drop all but the newest `keep_last` history snapshots. Returns how
    /// many were removed.
    fn clean_history(&self, keep_last: usize) -> OfcResult<usize>;
}

fn next_id(seq: &AtomicU64) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    format!("{:013}_{:06}", millis, seq.fetch_add(1, Ordering::SeqCst))
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

pub struct FileStore {
    root: PathBuf,
    seq: AtomicU64,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore {
            root: root.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// `$HOME/.ofc-solver/progress`
    pub fn default_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".ofc-solver").join("progress")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILE)
    }

    fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    fn backup_path(&self, id: &str) -> PathBuf {
        self.root
            .join(BACKUP_DIR)
            .join(format!("{}{}.json", BACKUP_PREFIX, id))
    }

    fn write_current(&self, blob: &str) -> OfcResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.current_path(), blob)?;
        Ok(())
    }

    /// History ids, oldest first.
    fn history_ids(&self) -> OfcResult<Vec<(String, usize)>> {
        let dir = self.history_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push((stem.to_string(), entry.metadata()?.len() as usize));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl ProgressStore for FileStore {
    fn save(&self, blob: &str) -> OfcResult<()> {
        self.write_current(blob)?;
        let dir = self.history_dir();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{}.json", next_id(&self.seq))), blob)?;
        Ok(())
    }

    fn load(&self) -> OfcResult<Option<String>> {
        let path = self.current_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn history(&self, limit: usize) -> OfcResult<Vec<HistoryEntry>> {
        Ok(self
            .history_ids()?
            .into_iter()
            .rev()
            .take(limit)
            .map(|(id, bytes)| HistoryEntry { id, bytes })
            .collect())
    }

    fn backup(&self) -> OfcResult<Option<String>> {
        let Some(blob) = self.load()? else {
            return Ok(None);
        };
        let id = next_id(&self.seq);
        let path = self.backup_path(&id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, blob)?;
        Ok(Some(id))
    }

    fn restore(&self, id: &str) -> OfcResult<()> {
        let path = self.backup_path(id);
        if !path.exists() {
            return Err(OfcError::PersistenceUnavailable(format!("no backup {}", id)));
        }
        let blob = fs::read_to_string(path)?;
        self.save(&blob)
    }

    fn clean_history(&self, keep_last: usize) -> OfcResult<usize> {
        let ids = self.history_ids()?;
        let excess = ids.len().saturating_sub(keep_last);
        for (id, _) in ids.iter().take(excess) {
            fs::remove_file(self.history_dir().join(format!("{}.json", id)))?;
        }
        Ok(excess)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    current: Option<String>,
    history: Vec<(String, String)>,
    backups: Vec<(String, String)>,
}

/// In-process store. `failing()` builds one whose every call errors, for
/// exercising the degraded paths.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    seq: AtomicU64,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn failing() -> Self {
        MemoryStore {
            failing: true,
            ..MemoryStore::default()
        }
    }

    fn check(&self) -> OfcResult<()> {
        if self.failing {
            Err(OfcError::PersistenceUnavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ProgressStore for MemoryStore {
    fn save(&self, blob: &str) -> OfcResult<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.current = Some(blob.to_string());
        inner.history.push((next_id(&self.seq), blob.to_string()));
        Ok(())
    }

    fn load(&self) -> OfcResult<Option<String>> {
        self.check()?;
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.current.clone())
    }

    fn history(&self, limit: usize) -> OfcResult<Vec<HistoryEntry>> {
        self.check()?;
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .history
            .iter()
            .rev()
            .take(limit)
            .map(|(id, blob)| HistoryEntry {
                id: id.clone(),
                bytes: blob.len(),
            })
            .collect())
    }

    fn backup(&self) -> OfcResult<Option<String>> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(blob) = inner.current.clone() else {
            return Ok(None);
        };
        let id = next_id(&self.seq);
        inner.backups.push((id.clone(), blob));
        Ok(Some(id))
    }

    fn restore(&self, id: &str) -> OfcResult<()> {
        self.check()?;
        let blob = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner
                .backups
                .iter()
                .find(|(b, _)| b == id)
                .map(|(_, blob)| blob.clone())
        };
        match blob {
            Some(blob) => self.save(&blob),
            None => Err(OfcError::PersistenceUnavailable(format!("no backup {}", id))),
        }
    }

    fn clean_history(&self, keep_last: usize) -> OfcResult<usize> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let excess = inner.history.len().saturating_sub(keep_last);
        inner.history.drain(..excess);
        Ok(excess)
    }
}
