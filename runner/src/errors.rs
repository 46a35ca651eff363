use std::io;

use arbiter::{ArbiterError, TaskId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to set up the bus arbiter: {0}")]
    Arbiter(ArbiterError),
    #[error("Error creating thread for {category} task #{id}: {source}")]
    ThreadCreation {
        category: &'static str,
        id: TaskId,
        source: io::Error,
    },
    #[error("Task thread `{name}` panicked")]
    TaskPanicked { name: String },
    #[error("Only {completed} of {expected} tasks reported completion")]
    MissingCompletions { completed: u64, expected: u64 },
}
