use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasklist_core::model::{Filter, Task, TaskId};
use tasklist_core::stats::Stats;

const SHORT_ID_LEN: usize = 8;

#[derive(Tabled)]
struct TaskRow {
    id: String,
    done: &'static str,
    priority: &'static str,
    text: String,
    created: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub description: &'static str,
}

/// Leading characters of long ids; `resolve_id` accepts them as a prefix.
pub fn short_id(id: &TaskId) -> String {
    match id {
        TaskId::Text(text) if text.chars().count() > SHORT_ID_LEN => {
            text.chars().take(SHORT_ID_LEN).collect()
        }
        other => other.to_string(),
    }
}

pub fn task_table(tasks: &[Task]) -> String {
    let rows = tasks.iter().map(|task| TaskRow {
        id: short_id(&task.id),
        done: if task.completed { "[x]" } else { "[ ]" },
        priority: task.priority.as_str(),
        text: task.text.clone(),
        created: task
            .created_at
            .get(..10)
            .unwrap_or(task.created_at.as_str())
            .to_string(),
    });

    Table::new(rows).with(Style::psql()).to_string()
}

pub fn empty_state(filter: Filter, search: &str) -> EmptyState {
    if !search.is_empty() {
        return EmptyState {
            title: "No matching tasks",
            description: "Try adjusting your search terms",
        };
    }

    match filter {
        Filter::Completed => EmptyState {
            title: "No completed tasks yet",
            description: "Complete some tasks to see them here",
        },
        Filter::Active => EmptyState {
            title: "No active tasks",
            description: "All caught up! Add a new task or check completed ones",
        },
        Filter::All => EmptyState {
            title: "No tasks yet",
            description: "Add your first task to get started!",
        },
    }
}

pub fn summary_line(stats: &Stats) -> Option<String> {
    (stats.total > 0).then(|| {
        format!(
            "{}% completion rate • {} tasks remaining",
            stats.completion_rate, stats.active
        )
    })
}

pub fn stats_text(stats: &Stats) -> String {
    format!(
        "Total: {}\nActive: {}\nCompleted: {}\nCompletion rate: {}%",
        stats.total, stats.active, stats.completed, stats.completion_rate
    )
}
