//! The four kinds of task the driver creates and the bodies they run.
use std::fmt::Display;
use std::sync::Arc;

use arbiter::{
    Arbiter, Direction, Priority, TaskDescriptor, TaskId, TaskSummary, Transfer, run_task,
};
use config::ast::TaskCounts;

/// Everything a task body needs from the driver.
#[derive(Clone)]
pub struct TaskContext {
    pub arbiter: Arc<Arbiter>,
    pub transfer: Arc<dyn Transfer>,
    pub id: TaskId,
}

pub type TaskBody = fn(&TaskContext) -> TaskSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskCategory {
    HighSend,
    HighReceive,
    NormalSend,
    NormalReceive,
}

impl TaskCategory {
    /// Order in which the driver creates tasks: all high-priority tasks
    /// first, senders before receivers.
    pub const SPAWN_ORDER: [TaskCategory; 4] = [
        TaskCategory::HighSend,
        TaskCategory::HighReceive,
        TaskCategory::NormalSend,
        TaskCategory::NormalReceive,
    ];

    pub fn descriptor(self) -> TaskDescriptor {
        match self {
            TaskCategory::HighSend => TaskDescriptor::new(Direction::Send, Priority::High),
            TaskCategory::HighReceive => TaskDescriptor::new(Direction::Receive, Priority::High),
            TaskCategory::NormalSend => TaskDescriptor::new(Direction::Send, Priority::Normal),
            TaskCategory::NormalReceive => {
                TaskDescriptor::new(Direction::Receive, Priority::Normal)
            }
        }
    }

    pub fn thread_name(self) -> &'static str {
        match self {
            TaskCategory::HighSend => "hiSend",
            TaskCategory::HighReceive => "hiRecv",
            TaskCategory::NormalSend => "send",
            TaskCategory::NormalReceive => "recv",
        }
    }

    pub fn count(self, counts: &TaskCounts) -> u32 {
        match self {
            TaskCategory::HighSend => counts.high_send,
            TaskCategory::HighReceive => counts.high_receive,
            TaskCategory::NormalSend => counts.normal_send,
            TaskCategory::NormalReceive => counts.normal_receive,
        }
    }

    pub fn body(self) -> TaskBody {
        match self {
            TaskCategory::HighSend => sender_priority_task,
            TaskCategory::HighReceive => receiver_priority_task,
            TaskCategory::NormalSend => sender_task,
            TaskCategory::NormalReceive => receiver_task,
        }
    }
}

impl Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

fn run(ctx: &TaskContext, category: TaskCategory) -> TaskSummary {
    run_task(
        &ctx.arbiter,
        ctx.transfer.as_ref(),
        ctx.id,
        category.descriptor(),
    )
}

/// Normal task sending data over the bus.
pub fn sender_task(ctx: &TaskContext) -> TaskSummary {
    run(ctx, TaskCategory::NormalSend)
}

/// Normal task reading data from the bus.
pub fn receiver_task(ctx: &TaskContext) -> TaskSummary {
    run(ctx, TaskCategory::NormalReceive)
}

/// High-priority task sending data over the bus.
pub fn sender_priority_task(ctx: &TaskContext) -> TaskSummary {
    run(ctx, TaskCategory::HighSend)
}

/// High-priority task reading data from the bus.
pub fn receiver_priority_task(ctx: &TaskContext) -> TaskSummary {
    run(ctx, TaskCategory::HighReceive)
}
