//! Diagnostic hooks.
//!
//! A hook installed on the [`Arbiter`](crate::Arbiter) sees every transition a
//! task goes through: announce, attempt, admit and release. Hooks run with the
//! arbiter's lock held so the order in which they observe events is the order
//! in which the bus state changed. They must not block and must not call back
//! into the arbiter.
use std::collections::HashMap;
use std::fmt::Display;

use parking_lot::Mutex;
use tracing::{Level, event};

use crate::errors::Violation;
use crate::state::BusSnapshot;
use crate::types::{Direction, TaskDescriptor, TaskId};

/// Target used by every transition event emitted through `tracing`.
pub const TRANSITION_TARGET: &str = "transition";

pub trait TraceHook: Send + Sync {
    fn on_transition(&self, event: &TransitionEvent);
}

impl<F> TraceHook for F
where
    F: Fn(&TransitionEvent) + Send + Sync,
{
    fn on_transition(&self, event: &TransitionEvent) {
        self(event)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// A high-priority task declared its intent to use the bus.
    Announce,
    /// The admission predicate was evaluated for a task.
    Attempt,
    Admit,
    Release,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Announce => "announce",
            Transition::Attempt => "attempt",
            Transition::Admit => "admit",
            Transition::Release => "release",
        }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionEvent {
    pub task: TaskId,
    pub descriptor: TaskDescriptor,
    pub transition: Transition,
    /// Bus state right after the transition took effect.
    pub snapshot: BusSnapshot,
}

/// Forwards transitions to `tracing` under [`TRANSITION_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl TraceHook for TracingHook {
    fn on_transition(&self, ev: &TransitionEvent) {
        event!(
            target: TRANSITION_TARGET,
            Level::INFO,
            task = ev.task,
            kind = ev.transition.as_str(),
            direction = ev.descriptor.direction.as_str(),
            priority = ev.descriptor.priority.as_str(),
            free_slots = ev.snapshot.free_slots as u64,
            waiting_send = ev.snapshot.waiting_send as u64,
            waiting_receive = ev.snapshot.waiting_receive as u64,
        );
    }
}

/// Keeps every transition in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<TransitionEvent>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().clone()
    }

    /// Recorded events of one kind, in order.
    pub fn of_kind(&self, transition: Transition) -> Vec<TransitionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|ev| ev.transition == transition)
            .copied()
            .collect()
    }

    /// Replay the recorded stream and report every broken bus invariant.
    /// Meant to be called once all recorded tasks have finished, otherwise
    /// tasks still on the bus are reported as unreleased.
    pub fn audit(&self) -> Vec<Violation> {
        audit(&self.events.lock())
    }
}

impl TraceHook for Recorder {
    fn on_transition(&self, event: &TransitionEvent) {
        self.events.lock().push(*event);
    }
}

pub fn audit(events: &[TransitionEvent]) -> Vec<Violation> {
    let mut violations = vec![];
    let mut active: HashMap<TaskId, Direction> = HashMap::new();
    for ev in events {
        let task = ev.task;
        let snapshot = &ev.snapshot;
        match ev.transition {
            Transition::Admit => {
                if active.contains_key(&task) {
                    violations.push(Violation::DoubleAdmission { task });
                    continue;
                }
                if active
                    .values()
                    .any(|direction| *direction != ev.descriptor.direction)
                {
                    violations.push(Violation::MixedDirections { task });
                }
                active.insert(task, ev.descriptor.direction);
                if active.len() > snapshot.capacity {
                    violations.push(Violation::CapacityExceeded {
                        task,
                        occupied: active.len(),
                        capacity: snapshot.capacity,
                    });
                }
                // Admitting a normal task leaves the board untouched, so the
                // snapshot shows what the predicate saw.
                if !ev.descriptor.is_high() && snapshot.waiting_high() > 0 {
                    violations.push(Violation::NormalBeforeHigh {
                        task,
                        waiting: snapshot.waiting_high(),
                    });
                }
            }
            Transition::Release => {
                if active.remove(&task).is_none() {
                    violations.push(Violation::ReleaseWithoutAdmission { task });
                }
            }
            Transition::Announce | Transition::Attempt => continue,
        }
        if active.len() + snapshot.free_slots != snapshot.capacity {
            violations.push(Violation::PermitLeak {
                task,
                held: active.len(),
                free: snapshot.free_slots,
                capacity: snapshot.capacity,
            });
        }
    }
    let mut unreleased: Vec<_> = active.into_keys().collect();
    unreleased.sort_unstable();
    violations.extend(
        unreleased
            .into_iter()
            .map(|task| Violation::Unreleased { task }),
    );
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;
    use pretty_assertions::assert_eq;

    fn snapshot(free_slots: usize, waiting_send: usize) -> BusSnapshot {
        BusSnapshot {
            capacity: 2,
            free_slots,
            direction: None,
            waiting_send,
            waiting_receive: 0,
            attempting: 0,
            completed: 0,
            peak_occupancy: 0,
            direction_switches: 0,
        }
    }

    fn event(
        task: TaskId,
        direction: Direction,
        priority: Priority,
        transition: Transition,
        snapshot: BusSnapshot,
    ) -> TransitionEvent {
        TransitionEvent {
            task,
            descriptor: TaskDescriptor::new(direction, priority),
            transition,
            snapshot,
        }
    }

    #[test]
    fn clean_stream_has_no_violations() {
        use Direction::*;
        use Priority::*;
        use Transition::*;
        let events = [
            event(0, Send, High, Announce, snapshot(2, 1)),
            event(0, Send, High, Admit, snapshot(1, 0)),
            event(1, Send, Normal, Admit, snapshot(0, 0)),
            event(0, Send, High, Release, snapshot(1, 0)),
            event(1, Send, Normal, Release, snapshot(2, 0)),
            event(2, Receive, Normal, Admit, snapshot(1, 0)),
            event(2, Receive, Normal, Release, snapshot(2, 0)),
        ];
        assert_eq!(audit(&events), vec![]);
    }

    #[test]
    fn detects_broken_invariants() {
        use Direction::*;
        use Priority::*;
        use Transition::*;
        let events = [
            event(0, Send, Normal, Admit, snapshot(1, 1)),
            event(1, Receive, Normal, Admit, snapshot(1, 0)),
            event(3, Send, Normal, Release, snapshot(1, 0)),
        ];
        assert_eq!(
            audit(&events),
            vec![
                Violation::NormalBeforeHigh {
                    task: 0,
                    waiting: 1
                },
                Violation::MixedDirections { task: 1 },
                Violation::PermitLeak {
                    task: 1,
                    held: 2,
                    free: 1,
                    capacity: 2
                },
                Violation::ReleaseWithoutAdmission { task: 3 },
                Violation::PermitLeak {
                    task: 3,
                    held: 2,
                    free: 1,
                    capacity: 2
                },
                Violation::Unreleased { task: 0 },
                Violation::Unreleased { task: 1 },
            ]
        );
    }

    #[test]
    fn closures_are_hooks() {
        let seen = Mutex::new(0);
        let hook = |_: &TransitionEvent| *seen.lock() += 1;
        let ev = event(
            7,
            Direction::Send,
            Priority::Normal,
            Transition::Attempt,
            snapshot(2, 0),
        );
        hook.on_transition(&ev);
        hook.on_transition(&ev);
        assert_eq!(*seen.lock(), 2);
    }
}
