use crate::error::AppError;
use crate::model::{Filter, Priority, Task, TaskId, matches_search};
use crate::persistence::TaskPersistence;
use crate::stats::{Stats, statistics};
use crate::storage::KeyValueStore;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Incoming records that were given a fresh id because theirs was already taken.
    pub rekeyed: usize,
    /// Incoming records dropped because their text was blank.
    pub skipped: usize,
}

/// Records `task`'s id in `taken`, swapping in a fresh id first when it is
/// already there. Returns whether the id changed.
fn claim_unique_id(task: &mut Task, taken: &mut HashSet<String>) -> bool {
    if taken.insert(task.id.to_string()) {
        return false;
    }

    let mut fresh = TaskId::generate();
    while !taken.insert(fresh.to_string()) {
        fresh = TaskId::generate();
    }
    tracing::debug!(old = %task.id, new = %fresh, "re-keyed task with duplicate id");
    task.id = fresh;
    true
}

/// Sole owner of the task collection. Every mutation that changes the
/// collection is persisted before it returns; storage failures are logged
/// and never reach the caller.
#[derive(Debug)]
pub struct TaskStore<S> {
    tasks: Vec<Task>,
    filter: Filter,
    search: String,
    persistence: TaskPersistence<S>,
    last_save_error: Option<AppError>,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn initialize(persistence: TaskPersistence<S>) -> Self {
        let loaded = persistence.load();
        if let Some(err) = loaded.error.as_ref() {
            tracing::warn!(error = %err, "could not load saved tasks, starting empty");
        }

        let mut tasks = loaded.tasks;
        let mut taken = HashSet::with_capacity(tasks.len());
        let mut rekeyed = 0;
        for task in tasks.iter_mut() {
            if claim_unique_id(task, &mut taken) {
                rekeyed += 1;
            }
        }

        let mut store = Self {
            tasks,
            filter: Filter::All,
            search: String::new(),
            persistence,
            last_save_error: None,
        };
        if rekeyed > 0 {
            tracing::warn!(rekeyed, "saved tasks had duplicate ids, assigned fresh ones");
            store.persist();
        }
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn persistence(&self) -> &TaskPersistence<S> {
        &self.persistence
    }

    pub fn last_save_error(&self) -> Option<&AppError> {
        self.last_save_error.as_ref()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Finds a task by its full id text, or by a prefix shared with no other task.
    pub fn resolve_id(&self, raw: &str) -> Option<TaskId> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(task) = self.tasks.iter().find(|task| task.id.to_string() == trimmed) {
            return Some(task.id.clone());
        }

        let mut candidates = self
            .tasks
            .iter()
            .filter(|task| task.id.to_string().starts_with(trimmed));
        match (candidates.next(), candidates.next()) {
            (Some(task), None) => Some(task.id.clone()),
            _ => None,
        }
    }

    pub fn add(&mut self, raw_text: &str) -> Option<Task> {
        self.add_with_priority(raw_text, Priority::Medium)
    }

    pub fn add_with_priority(&mut self, raw_text: &str, priority: Priority) -> Option<Task> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let task = match Task::new(trimmed.to_string(), priority) {
            Ok(task) => task,
            Err(err) => {
                tracing::warn!(error = %err, "could not create task");
                return None;
            }
        };
        self.tasks.insert(0, task.clone());
        self.persist();

        Some(task)
    }

    pub fn delete(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        self.persist();

        Some(removed)
    }

    pub fn toggle(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        let updated = task.clone();
        self.persist();

        Some(updated)
    }

    /// Replaces the text of a task. Blank or unchanged text leaves the task alone.
    pub fn update(&mut self, id: &TaskId, new_text: &str) -> Option<Task> {
        let trimmed = new_text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        if task.text == trimmed {
            return None;
        }
        task.text = trimmed.to_string();
        let updated = task.clone();
        self.persist();

        Some(updated)
    }

    pub fn set_priority(&mut self, id: &TaskId, priority: Priority) -> Option<Task> {
        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        if task.priority == priority {
            return None;
        }
        task.priority = priority;
        let updated = task.clone();
        self.persist();

        Some(updated)
    }

    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed);
        let removed = before - self.tasks.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    pub fn clear_all(&mut self) -> usize {
        let removed = self.tasks.len();
        if removed > 0 {
            self.tasks.clear();
            self.persist();
        }
        removed
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn set_search<T: Into<String>>(&mut self, search: T) {
        self.search = search.into();
    }

    pub fn filtered_view(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.matches(task) && matches_search(task, &self.search))
            .cloned()
            .collect()
    }

    pub fn statistics(&self) -> Stats {
        statistics(&self.tasks)
    }

    pub fn export_snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Puts `incoming` in front of the current tasks, keeping its order.
    /// Text is trimmed and blank records are dropped; ids already in use get
    /// replaced so every id stays unique.
    pub fn import_merge(&mut self, incoming: Vec<Task>) -> ImportSummary {
        let mut taken: HashSet<String> = self.tasks.iter().map(|task| task.id.to_string()).collect();
        let mut rekeyed = 0;
        let mut skipped = 0;
        let mut merged = Vec::with_capacity(incoming.len() + self.tasks.len());

        for mut task in incoming {
            let trimmed = task.text.trim();
            if trimmed.is_empty() {
                skipped += 1;
                continue;
            }
            task.text = trimmed.to_string();
            if claim_unique_id(&mut task, &mut taken) {
                rekeyed += 1;
            }
            merged.push(task);
        }

        let imported = merged.len();
        if imported > 0 {
            merged.append(&mut self.tasks);
            self.tasks = merged;
            self.persist();
        }

        ImportSummary {
            imported,
            rekeyed,
            skipped,
        }
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn persist(&mut self) {
        match self.persistence.save(&self.tasks) {
            Ok(()) => self.last_save_error = None,
            Err(err) => {
                tracing::warn!(error = %err, "could not save tasks");
                self.last_save_error = Some(err);
            }
        }
    }
}
