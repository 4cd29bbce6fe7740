use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::path::{Path, PathBuf};

const STORE_DIR_ENV_VAR: &str = "TASKLIST_STORE_DIR";
const APP_DIR_NAME: &str = "tasklist";

/// Key-value store keeping one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

/// Resolves the store directory: `TASKLIST_STORE_DIR`, then the configured
/// directory, then the per-user default.
pub fn store_dir(configured: Option<&str>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open(configured: Option<&str>) -> Result<Self, AppError> {
        Ok(Self::new(store_dir(configured)?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
        if !valid {
            return Err(AppError::invalid_input(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.slot_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| AppError::storage_read(format!("{}: {}", path.display(), err)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.slot_path(key)?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| AppError::storage_write(err.to_string()))?;
        std::fs::write(&path, value)
            .map_err(|err| AppError::storage_write(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::storage_write(err.to_string()))?;
        }

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let path = self.slot_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::storage_write(format!(
                "{}: {}",
                path.display(),
                err
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileStore;
    use crate::storage::KeyValueStore;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasklist-{nanos}-{name}"))
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = FileStore::new(temp_dir("missing"));
        assert_eq!(store.get("todo-master-data").unwrap(), None);
    }

    #[test]
    fn set_creates_directory_and_round_trips() {
        let dir = temp_dir("round-trip");
        let mut store = FileStore::new(&dir);

        store.set("todo-master-data", "[]").unwrap();
        let loaded = store.get("todo-master-data").unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded.as_deref(), Some("[]"));
    }

    #[cfg(unix)]
    #[test]
    fn set_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("perms");
        let mut store = FileStore::new(&dir);
        store.set("todos", "[]").unwrap();
        let mode = fs::metadata(dir.join("todos")).unwrap().permissions().mode();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = temp_dir("remove");
        let mut store = FileStore::new(&dir);
        store.set("todos", "[]").unwrap();

        store.remove("todos").unwrap();
        store.remove("todos").unwrap();
        let loaded = store.get("todos").unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, None);
    }

    #[test]
    fn rejects_path_like_keys() {
        let mut store = FileStore::new(temp_dir("keys"));

        assert_eq!(store.get("../etc").unwrap_err().code(), "invalid_input");
        assert_eq!(store.set("a/b", "x").unwrap_err().code(), "invalid_input");
        assert_eq!(store.remove("").unwrap_err().code(), "invalid_input");
    }
}
