//! Execution of a single task: get a slot, transfer, leave.
use std::time::Duration;

use tracing::debug;

use crate::Arbiter;
use crate::types::{Direction, Priority, TaskDescriptor, TaskId};

/// Performs the data transfer of an admitted task. Implementations own no bus
/// state; they only take time.
pub trait Transfer: Send + Sync {
    /// Run the transfer and return how long it took.
    fn transfer(&self, id: TaskId, task: TaskDescriptor) -> Duration;
}

/// What happened to one task between arrival and release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSummary {
    pub id: TaskId,
    pub direction: Direction,
    pub priority: Priority,
    /// Admission sequence number on the bus, from 1.
    pub sequence: u64,
    /// Number of admission checks before the task got in.
    pub checks: u64,
    pub waited: Duration,
    pub transfer: Duration,
}

pub fn run_task(
    arbiter: &Arbiter,
    transfer: &dyn Transfer,
    id: TaskId,
    task: TaskDescriptor,
) -> TaskSummary {
    let slot = arbiter.acquire(id, task);
    debug!(task = id, "{task} is now transferring");
    let elapsed = transfer.transfer(id, task);
    debug!(task = id, ?elapsed, "{task} finished transferring");
    let summary = TaskSummary {
        id,
        direction: task.direction,
        priority: task.priority,
        sequence: slot.sequence(),
        checks: slot.checks(),
        waited: slot.waited(),
        transfer: elapsed,
    };
    drop(slot);
    summary
}
