use crate::model::Task;
use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// Percentage of completed tasks, rounded half away from zero. Zero for an empty list.
    pub completion_rate: u32,
}

pub fn statistics(tasks: &[Task]) -> Stats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();
    let completion_rate = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };

    Stats {
        total,
        active: total - completed,
        completed,
        completion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::{Stats, statistics};
    use crate::model::{Priority, Task, TaskId};

    fn tasks(completed_flags: &[bool]) -> Vec<Task> {
        completed_flags
            .iter()
            .enumerate()
            .map(|(index, completed)| Task {
                id: TaskId::Text(format!("task-{index}")),
                text: format!("task {index}"),
                completed: *completed,
                created_at: "2025-12-20T00:00:00Z".to_string(),
                priority: Priority::Medium,
            })
            .collect()
    }

    #[test]
    fn empty_list_has_zero_rate() {
        assert_eq!(statistics(&[]), Stats::default());
    }

    #[test]
    fn one_of_three_rounds_down_to_33() {
        let stats = statistics(&tasks(&[true, false, false]));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completion_rate, 33);
    }

    #[test]
    fn two_of_three_rounds_up_to_67() {
        assert_eq!(statistics(&tasks(&[true, true, false])).completion_rate, 67);
    }

    #[test]
    fn half_rounds_away_from_zero() {
        // 1/8 = 12.5%
        let stats = statistics(&tasks(&[true, false, false, false, false, false, false, false]));
        assert_eq!(stats.completion_rate, 13);
    }

    #[test]
    fn counts_always_add_up() {
        for flags in [
            vec![],
            vec![true],
            vec![false],
            vec![true, false, true, true, false],
        ] {
            let stats = statistics(&tasks(&flags));
            assert_eq!(stats.active + stats.completed, stats.total);
        }
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(statistics(&tasks(&[true]))).unwrap();
        assert_eq!(json["completionRate"], 100);
    }
}
