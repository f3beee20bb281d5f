use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::credential::CredentialPair;
use crate::error::RagchatError;

/// Durable holder of the current credential pair.
///
/// Stores only persist; serializing writes is the refresh coordinator's job.
pub trait CredentialStore: Send + Sync {
    /// The stored pair, or `None` before any save or after a clear.
    fn load(&self) -> Option<CredentialPair>;

    fn save(&self, pair: &CredentialPair) -> Result<(), RagchatError>;

    fn clear(&self) -> Result<(), RagchatError>;

    /// When the current pair was saved, if the store tracks it.
    fn saved_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl std::fmt::Debug for dyn CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCredentials {
    #[serde(flatten)]
    pair: CredentialPair,
    saved_at: DateTime<Utc>,
}

pub fn session_path(session: &str) -> PathBuf {
    let name: String = session
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ragchat")
        .join("sessions")
        .join(name)
        .join("credentials.json")
}

/// One JSON record per session on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Option<PersistedCredentials> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable credential record: {e}");
                None
            }
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<CredentialPair> {
        self.read_record().map(|record| record.pair)
    }

    /// Write to a unique temp file and rename it over the record, so readers
    /// see either the old pair or the new one.
    fn save(&self, pair: &CredentialPair) -> Result<(), RagchatError> {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let record = PersistedCredentials {
            pair: pair.clone(),
            saved_at: Utc::now(),
        };
        let data = serde_json::to_string_pretty(&record).map_err(|e| {
            RagchatError::StorageError(format!("Failed to serialize credentials: {e}"))
        })?;

        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        let written = write_private(&tmp_path, data.as_bytes())
            .and_then(|()| std::fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), "saved credentials");
        Ok(())
    }

    fn clear(&self) -> Result<(), RagchatError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "cleared credentials");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.read_record().map(|record| record.saved_at)
    }
}

/// Create `path` readable by the owner only and write `data` to it.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    current: Mutex<Option<(CredentialPair, DateTime<Utc>)>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            current: Mutex::new(Some((pair, Utc::now()))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<CredentialPair> {
        let guard = self.current.lock().ok()?;
        guard.as_ref().map(|(pair, _)| pair.clone())
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), RagchatError> {
        let mut guard = self
            .current
            .lock()
            .map_err(|_| RagchatError::StorageError("credential store lock poisoned".into()))?;
        *guard = Some((pair.clone(), Utc::now()));
        Ok(())
    }

    fn clear(&self) -> Result<(), RagchatError> {
        let mut guard = self
            .current
            .lock()
            .map_err(|_| RagchatError::StorageError("credential store lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        let guard = self.current.lock().ok()?;
        guard.as_ref().map(|(_, at)| *at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_path_structure() {
        let path = session_path("work");
        let path_str = path.to_string_lossy();
        assert!(path_str.contains(".ragchat"));
        assert!(path_str.contains("work"));
        assert!(path_str.ends_with("credentials.json"));
    }

    #[test]
    fn session_path_sanitizes_separators() {
        let path = session_path("../escape");
        assert!(path.to_string_lossy().contains("___escape"));
        assert_ne!(session_path("a"), session_path("b"));
    }

    #[test]
    fn file_load_before_save_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::at(dir.path().join("credentials.json"));
        assert!(store.load().is_none());
        assert!(store.saved_at().is_none());
    }

    #[test]
    fn file_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::at(dir.path().join("nested").join("credentials.json"));
        store.save(&CredentialPair::new("a1", "r1")).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access(), "a1");
        assert_eq!(loaded.refresh(), "r1");
        assert!(store.saved_at().is_some());
    }

    #[test]
    fn file_save_replaces_whole_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::at(dir.path().join("credentials.json"));
        store.save(&CredentialPair::new("a1", "r1")).unwrap();
        store.save(&CredentialPair::new("a2", "r2")).unwrap();
        assert_eq!(store.load().unwrap(), CredentialPair::new("a2", "r2"));

        // No temp files left behind.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn file_clear_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::at(dir.path().join("credentials.json"));
        store.save(&CredentialPair::new("a1", "r1")).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn file_clear_when_absent_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::at(dir.path().join("credentials.json"));
        assert!(store.clear().is_ok());
    }

    #[test]
    fn file_corrupt_record_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"access":"only-access"}"#).unwrap();
        let store = FileCredentialStore::at(path);
        assert!(store.load().is_none());
    }

    #[test]
    fn file_record_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::at(&path);
        store.save(&CredentialPair::new("a1", "r1")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["access"], "a1");
        assert_eq!(raw["refresh"], "r1");
        assert!(raw["saved_at"].is_string());
    }

    #[cfg(unix)]
    #[test]
    fn file_record_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::at(dir.path().join("credentials.json"));
        store.save(&CredentialPair::new("a1", "r1")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("credentials.json");
        // A non-empty directory at the record path makes the rename fail.
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), "x").unwrap();

        let store = FileCredentialStore::at(&target);
        assert!(store.save(&CredentialPair::new("a1", "r1")).is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");
    }

    #[cfg(unix)]
    #[test]
    fn temp_file_is_created_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staged.tmp");
        write_private(&path, b"secret").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(write_private(&path, b"again").is_err(), "existing file is never reused");
    }

    #[test]
    fn memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().is_none());
        store.save(&CredentialPair::new("a1", "r1")).unwrap();
        assert_eq!(store.load().unwrap().access(), "a1");
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
