pub mod config;
pub mod error;
pub mod model;
pub mod persistence;
pub mod stats;
pub mod storage;
pub mod task_store;

pub use task_store::{ImportSummary, TaskStore};

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Priority, Task, TaskId};

    #[test]
    fn task_has_required_fields() {
        let task = Task {
            id: TaskId::from("task-1"),
            text: "demo".to_string(),
            completed: false,
            created_at: "2025-12-20T00:00:00Z".to_string(),
            priority: Priority::default(),
        };

        assert_eq!(task.id.to_string(), "task-1");
        assert_eq!(task.text, "demo");
        assert!(!task.completed);
        assert_eq!(task.created_at, "2025-12-20T00:00:00Z");
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::parse("Invalid JSON file");
        assert_eq!(err.code(), "parse_error");
        assert_eq!(err.to_string(), "parse_error - Invalid JSON file");
    }
}
