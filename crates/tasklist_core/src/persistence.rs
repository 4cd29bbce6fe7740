use crate::error::AppError;
use crate::model::Task;
use crate::storage::KeyValueStore;
use std::path::Path;
use time::Date;
use time::macros::format_description;

pub const STORAGE_KEY: &str = "todo-master-data";
/// Key written by an earlier revision of the app; read once when the primary key is absent.
pub const LEGACY_STORAGE_KEY: &str = "todos";

#[derive(Debug, Clone)]
pub struct TaskLoad {
    pub tasks: Vec<Task>,
    pub error: Option<AppError>,
}

/// Moves task collections between the key-value store and the JSON interchange text.
#[derive(Debug)]
pub struct TaskPersistence<S> {
    store: S,
}

impl<S: KeyValueStore> TaskPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load(&self) -> TaskLoad {
        match self.load_raw() {
            Ok(tasks) => TaskLoad { tasks, error: None },
            Err(err) => TaskLoad {
                tasks: Vec::new(),
                error: Some(err),
            },
        }
    }

    fn load_raw(&self) -> Result<Vec<Task>, AppError> {
        let content = match self.store.get(STORAGE_KEY)? {
            Some(content) => content,
            None => match self.store.get(LEGACY_STORAGE_KEY)? {
                Some(content) => {
                    tracing::debug!(key = LEGACY_STORAGE_KEY, "loading tasks from legacy key");
                    content
                }
                None => return Ok(Vec::new()),
            },
        };

        serde_json::from_str(&content)
            .map_err(|err| AppError::storage_read(format!("malformed task data: {err}")))
    }

    pub fn save(&mut self, tasks: &[Task]) -> Result<(), AppError> {
        let content =
            serde_json::to_string(tasks).map_err(|err| AppError::storage_write(err.to_string()))?;
        self.store.set(STORAGE_KEY, &content)?;
        tracing::debug!(count = tasks.len(), "saved tasks");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        self.store.remove(STORAGE_KEY)?;
        self.store.remove(LEGACY_STORAGE_KEY)
    }
}

pub fn export_to_text(tasks: &[Task]) -> Result<String, AppError> {
    serde_json::to_string_pretty(tasks).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn import_from_text(text: &str) -> Result<Vec<Task>, AppError> {
    serde_json::from_str(text).map_err(|err| AppError::parse(format!("Invalid JSON file: {err}")))
}

pub fn read_import_file(path: &Path) -> Result<Vec<Task>, AppError> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::io(format!("Error reading file {}: {}", path.display(), err))
    })?;
    import_from_text(&content)
}

pub fn backup_file_name(date: Date) -> Result<String, AppError> {
    let formatted = date
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    Ok(format!("todo-backup-{formatted}.json"))
}
