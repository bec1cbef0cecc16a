use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Durable slot holding the epoch-ms heal timestamp. Absent means healthy.
pub trait HealStore {
    fn load(&self) -> Option<i64>;
    fn save(&mut self, heal_at_ms: i64) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct HealFile {
    heal_at_ms: i64,
}

/// Stores the heal timestamp as `heal.json` inside a data directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "heal.json";

    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HealStore for FileStore {
    fn load(&self) -> Option<i64> {
        let s = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("cannot read {}: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str::<HealFile>(&s) {
            Ok(f) => Some(f.heal_at_ms),
            Err(e) => {
                log::warn!("ignoring unreadable {}: {e}", self.path.display());
                None
            }
        }
    }

    fn save(&mut self, heal_at_ms: i64) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&HealFile { heal_at_ms })?;
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        atomic_rename(&tmp, &self.path)
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("renaming into {}", to.display()))?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Option<i64>,
}

impl HealStore for MemoryStore {
    fn load(&self) -> Option<i64> {
        self.slot
    }

    fn save(&mut self, heal_at_ms: i64) -> Result<()> {
        self.slot = Some(heal_at_ms);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bike-sim-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = scratch_dir("reopen");
        let mut store = FileStore::new(&dir);
        assert_eq!(store.load(), None);
        store.save(1_234_567).unwrap();

        let reopened = FileStore::new(&dir);
        assert_eq!(reopened.load(), Some(1_234_567));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_clear_is_idempotent() {
        let dir = scratch_dir("clear");
        let mut store = FileStore::new(&dir);
        store.save(42).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
        assert!(!store.path().exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_file_reads_as_absent() {
        let dir = scratch_dir("corrupt");
        let store = FileStore::new(&dir);
        fs::write(store.path(), b"not json").unwrap();
        assert_eq!(store.load(), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unreadable_path_reads_as_absent() {
        let dir = scratch_dir("unreadable");
        let store = FileStore::new(&dir);
        // a directory where the file should be cannot be read as text
        fs::create_dir_all(store.path()).unwrap();
        assert_eq!(store.load(), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn memory_store_overwrites() {
        let mut s = MemoryStore::default();
        s.save(1).unwrap();
        s.save(2).unwrap();
        assert_eq!(s.load(), Some(2));
    }
}
