//! Arbitration of a shared, capacity-limited bus between send and receive
//! tasks of two priority classes.
//!
//! Every decision is taken under one lock guarding a single [`BusState`]: the
//! capacity gate, the announcement board and the current direction. Tasks
//! that are not admissible wait on a condition variable (or spin with a yield,
//! see [`WaitStrategy`]) and re-check the predicate whenever they wake.
pub mod board;
pub mod errors;
pub mod gate;
pub mod hook;
pub mod log;
mod state;
pub mod task;
pub mod types;

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error};

pub use errors::{ArbiterError, ConfigurationError};
pub use hook::{Recorder, TraceHook, TracingHook, Transition, TransitionEvent};
pub use state::BusSnapshot;
pub use task::{TaskSummary, Transfer, run_task};
pub use types::{Direction, Priority, TaskDescriptor, TaskId};

use state::BusState;

/// How a task that is not admissible waits before checking again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Sleep on a condition variable until the bus state changes.
    #[default]
    Block,
    /// Drop the lock, yield the processor and retry immediately.
    Yield,
}

pub struct Arbiter {
    state: Mutex<BusState>,
    changed: Condvar,
    wait: WaitStrategy,
    hook: Option<Arc<dyn TraceHook>>,
    tracing: AtomicBool,
}

impl Arbiter {
    /// Create the arbiter for a bus of `capacity` slots.
    ///
    /// # Arguments
    /// * `capacity`: Number of tasks allowed on the bus at once.
    /// * `initial`: Direction recorded before the first admission. It has no
    ///   effect on decisions since the bus starts empty.
    /// * `wait`: How tasks wait between admission checks.
    pub fn new(
        capacity: usize,
        initial: Direction,
        wait: WaitStrategy,
    ) -> Result<Self, ArbiterError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigurationError::ZeroCapacity)?;
        Ok(Self {
            state: Mutex::new(BusState::new(capacity, initial)),
            changed: Condvar::new(),
            wait,
            hook: None,
            tracing: AtomicBool::new(false),
        })
    }

    /// Install a diagnostic hook and switch tracing on.
    pub fn with_hook(mut self, hook: Arc<dyn TraceHook>) -> Self {
        self.hook = Some(hook);
        self.tracing = AtomicBool::new(true);
        self
    }

    /// Toggle hook invocations at runtime. Has no effect without a hook.
    pub fn set_tracing(&self, enabled: bool) {
        self.tracing.store(enabled, Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().gate.capacity()
    }

    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }

    pub fn snapshot(&self) -> BusSnapshot {
        self.state.lock().snapshot()
    }

    /// Number of tasks that have released their slot.
    pub fn completed(&self) -> u64 {
        self.state.lock().completed()
    }

    /// Block until `task` is admitted to the bus.
    ///
    /// High-priority tasks announce themselves before their first check. The
    /// returned [`Slot`] holds the task's permit and gives it back when
    /// dropped.
    pub fn acquire(&self, id: TaskId, task: TaskDescriptor) -> Slot<'_> {
        let arrived = Instant::now();
        let mut state = self.state.lock();
        debug!(task = id, "{task} arrived");
        if task.is_high() {
            state.board.announce(task.direction);
            self.emit(id, task, Transition::Announce, &state);
            self.changed.notify_all();
        }
        state.attempting += 1;
        let mut checks = 0;
        loop {
            checks += 1;
            self.emit(id, task, Transition::Attempt, &state);
            if state.admissible(task) {
                break;
            }
            match self.wait {
                WaitStrategy::Block => self.changed.wait(&mut state),
                WaitStrategy::Yield => MutexGuard::unlocked(&mut state, thread::yield_now),
            }
        }
        state.attempting -= 1;
        let sequence = state.admit(task);
        self.emit(id, task, Transition::Admit, &state);
        debug!(
            task = id,
            sequence,
            free_slots = state.gate.free(),
            "{task} gets a slot"
        );
        drop(state);
        if task.is_high() {
            // The withdrawal may have cleared the board for normal tasks.
            self.changed.notify_all();
        }
        Slot {
            arbiter: self,
            id,
            task,
            sequence,
            checks,
            waited: arrived.elapsed(),
        }
    }

    fn leave(&self, id: TaskId, task: TaskDescriptor) {
        let mut state = self.state.lock();
        state.release();
        self.emit(id, task, Transition::Release, &state);
        debug!(
            task = id,
            free_slots = state.gate.free(),
            completed = state.completed(),
            "{task} leaving slot"
        );
        drop(state);
        self.changed.notify_all();
    }

    fn emit(&self, id: TaskId, task: TaskDescriptor, transition: Transition, state: &BusState) {
        if !self.tracing.load(Ordering::Relaxed) {
            return;
        }
        let Some(hook) = &self.hook else {
            return;
        };
        let event = TransitionEvent {
            task: id,
            descriptor: task,
            transition,
            snapshot: state.snapshot(),
        };
        // A failing hook must leave the bus state as it found it.
        if panic::catch_unwind(AssertUnwindSafe(|| hook.on_transition(&event))).is_err() {
            error!(task = id, %transition, "trace hook panicked");
        }
    }
}

/// A permit on the bus held by an admitted task. Dropping it releases the
/// permit, so a slot is given back exactly once.
#[must_use = "dropping the slot releases it immediately"]
pub struct Slot<'a> {
    arbiter: &'a Arbiter,
    id: TaskId,
    task: TaskDescriptor,
    sequence: u64,
    checks: u64,
    waited: Duration,
}

impl Slot<'_> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn task(&self) -> TaskDescriptor {
        self.task
    }

    /// Position of this admission among all admissions on the bus, from 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// How many times the admission predicate was evaluated for the task.
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Time between arrival and admission.
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.arbiter.leave(self.id, self.task);
    }
}
