mod filter;
mod task;

pub use filter::{Filter, matches_search};
pub use task::{Priority, Task, TaskId};
