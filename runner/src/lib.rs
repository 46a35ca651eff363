//! Driver for the bus arbiter: creates one thread per task, waits until every
//! task has released its slot and reported back, and summarizes the run.
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use arbiter::{Arbiter, TaskId, TaskSummary, TraceHook, Transfer};
use config::ast::{self, TaskCounts};
use tracing::{error, info, instrument};

pub mod categories;
pub mod cli;
pub mod errors;
pub mod transfer;
pub mod types;

use categories::{TaskCategory, TaskContext};
use errors::RunnerError;
use transfer::SleepTransfer;

pub use cli::RunCmd;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Tasks that released their slot and reported completion.
    pub completed: u64,
    /// Per-task summaries ordered by task id.
    pub tasks: Vec<TaskSummary>,
    pub peak_occupancy: usize,
    pub direction_switches: u64,
    pub elapsed: Duration,
}

/// Build the arbiter and transfer simulator described by `schedule` and run
/// its tasks. The hook, if any, is switched on when the schedule asks for
/// tracing.
pub fn run(
    schedule: &ast::Schedule,
    hook: Option<Arc<dyn TraceHook>>,
) -> Result<ScheduleReport, RunnerError> {
    let arbiter = make_arbiter(&schedule.bus).map_err(RunnerError::Arbiter)?;
    let arbiter = match hook {
        Some(hook) => {
            let arbiter = arbiter.with_hook(hook);
            arbiter.set_tracing(schedule.trace);
            arbiter
        }
        None => arbiter,
    };
    let transfer = SleepTransfer::from_params(&schedule.transfer);
    run_scheduler(Arc::new(arbiter), Arc::new(transfer), schedule.tasks)
}

pub fn make_arbiter(bus: &ast::BusParams) -> Result<Arbiter, arbiter::ArbiterError> {
    Arbiter::new(
        bus.capacity.get(),
        types::direction(bus.initial_direction),
        types::wait_strategy(bus.wait),
    )
}

/// Create every task, then block until all of them have released their slot
/// and reported completion.
///
/// Tasks are created in [`TaskCategory::SPAWN_ORDER`] and numbered from 0 in
/// creation order. If a thread cannot be created, no further tasks are
/// spawned; the ones already running are still waited for before the error is
/// returned.
#[instrument(skip_all, fields(total = counts.total()))]
pub fn run_scheduler(
    arbiter: Arc<Arbiter>,
    transfer: Arc<dyn Transfer>,
    counts: TaskCounts,
) -> Result<ScheduleReport, RunnerError> {
    let start = Instant::now();
    let expected = counts.total();
    let (tx, rx) = crossbeam_channel::unbounded::<TaskSummary>();
    let mut handles = vec![];
    let mut spawn_error = None;
    let mut next_id: TaskId = 0;

    'spawn: for category in TaskCategory::SPAWN_ORDER {
        for _ in 0..category.count(&counts) {
            let ctx = TaskContext {
                arbiter: arbiter.clone(),
                transfer: transfer.clone(),
                id: next_id,
            };
            let body = category.body();
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(category.thread_name().to_string())
                .spawn(move || {
                    let summary = body(&ctx);
                    // The driver keeps listening until every sender is gone.
                    let _ = tx.send(summary);
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    error!("Unable to create thread for {category} task #{next_id}");
                    spawn_error = Some(RunnerError::ThreadCreation {
                        category: category.thread_name(),
                        id: next_id,
                        source,
                    });
                    break 'spawn;
                }
            }
            next_id += 1;
        }
    }
    drop(tx);
    info!(created = handles.len(), "tasks created");

    let mut tasks: Vec<TaskSummary> = rx.iter().collect();
    let mut panicked = None;
    for handle in handles {
        let name = handle.thread().name().unwrap_or("task").to_string();
        if handle.join().is_err() {
            error!("Task thread `{name}` panicked");
            panicked.get_or_insert(RunnerError::TaskPanicked { name });
        }
    }
    if let Some(e) = spawn_error.or(panicked) {
        return Err(e);
    }

    let completed = tasks.len() as u64;
    if completed != expected {
        return Err(RunnerError::MissingCompletions {
            completed,
            expected,
        });
    }
    tasks.sort_unstable_by_key(|task| task.id);
    let snapshot = arbiter.snapshot();
    let report = ScheduleReport {
        completed,
        tasks,
        peak_occupancy: snapshot.peak_occupancy,
        direction_switches: snapshot.direction_switches,
        elapsed: start.elapsed(),
    };
    info!(
        completed = report.completed,
        peak_occupancy = report.peak_occupancy,
        direction_switches = report.direction_switches,
        "all tasks finished"
    );
    Ok(report)
}
