//! Shared bus state. One instance per arbiter, only ever touched with the
//! arbiter's lock held.
use std::num::NonZeroUsize;

use crate::board::AnnouncementBoard;
use crate::gate::CapacityGate;
use crate::types::{Direction, TaskDescriptor};

#[derive(Debug)]
pub(crate) struct BusState {
    pub(crate) gate: CapacityGate,
    pub(crate) board: AnnouncementBoard,
    /// Direction of the tasks holding the bus. Only meaningful while the gate
    /// is not idle.
    direction: Direction,
    /// Tasks that have arrived but are not admitted yet.
    pub(crate) attempting: usize,
    completed: u64,
    admissions: u64,
    peak: usize,
    switches: u64,
}

/// Point-in-time copy of the bus state, as seen by hooks and observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusSnapshot {
    pub capacity: usize,
    pub free_slots: usize,
    /// `None` while the bus is empty.
    pub direction: Option<Direction>,
    pub waiting_send: usize,
    pub waiting_receive: usize,
    pub attempting: usize,
    pub completed: u64,
    pub peak_occupancy: usize,
    pub direction_switches: u64,
}

impl BusSnapshot {
    pub fn occupied(&self) -> usize {
        self.capacity - self.free_slots
    }

    pub fn waiting_high(&self) -> usize {
        self.waiting_send + self.waiting_receive
    }
}

impl BusState {
    pub(crate) fn new(capacity: NonZeroUsize, initial: Direction) -> Self {
        Self {
            gate: CapacityGate::new(capacity),
            board: AnnouncementBoard::default(),
            direction: initial,
            attempting: 0,
            completed: 0,
            admissions: 0,
            peak: 0,
            switches: 0,
        }
    }

    /// The admission predicate.
    ///
    /// A direction change needs a fully drained bus. Normal-priority tasks
    /// additionally defer while any high-priority task is announced. A free
    /// permit is required as well since admission takes one immediately.
    pub(crate) fn admissible(&self, task: TaskDescriptor) -> bool {
        let direction_ok = self.gate.is_idle() || self.direction == task.direction;
        let priority_ok = task.is_high() || !self.board.any();
        direction_ok && priority_ok && self.gate.has_permit()
    }

    /// Commit an admission. Must only follow a successful [`Self::admissible`]
    /// check under the same lock. Returns the admission sequence number.
    pub(crate) fn admit(&mut self, task: TaskDescriptor) -> u64 {
        if self.gate.is_idle() && self.direction != task.direction && self.admissions > 0 {
            self.switches += 1;
        }
        self.direction = task.direction;
        let acquired = self.gate.try_acquire();
        debug_assert!(acquired, "admitted without a free permit");
        if task.is_high() {
            self.board.withdraw(task.direction);
        }
        self.peak = self.peak.max(self.gate.occupied());
        self.admissions += 1;
        self.admissions
    }

    pub(crate) fn release(&mut self) {
        self.gate.release();
        self.completed += 1;
    }

    pub(crate) fn completed(&self) -> u64 {
        self.completed
    }

    pub(crate) fn snapshot(&self) -> BusSnapshot {
        BusSnapshot {
            capacity: self.gate.capacity(),
            free_slots: self.gate.free(),
            direction: (!self.gate.is_idle()).then_some(self.direction),
            waiting_send: self.board.waiting(Direction::Send),
            waiting_receive: self.board.waiting(Direction::Receive),
            attempting: self.attempting,
            completed: self.completed,
            peak_occupancy: self.peak,
            direction_switches: self.switches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    const NORMAL_SEND: TaskDescriptor = TaskDescriptor::new(Direction::Send, Priority::Normal);
    const NORMAL_RECV: TaskDescriptor = TaskDescriptor::new(Direction::Receive, Priority::Normal);
    const HIGH_SEND: TaskDescriptor = TaskDescriptor::new(Direction::Send, Priority::High);
    const HIGH_RECV: TaskDescriptor = TaskDescriptor::new(Direction::Receive, Priority::High);

    fn state(capacity: usize) -> BusState {
        BusState::new(NonZeroUsize::new(capacity).unwrap(), Direction::Receive)
    }

    #[test]
    fn empty_bus_admits_any_direction() {
        let state = state(3);
        for task in [NORMAL_SEND, NORMAL_RECV, HIGH_SEND, HIGH_RECV] {
            assert!(state.admissible(task), "{task} rejected on empty bus");
        }
    }

    #[test]
    fn occupied_bus_rejects_opposite_direction() {
        let mut state = state(3);
        state.admit(NORMAL_SEND);
        assert!(state.admissible(NORMAL_SEND));
        assert!(!state.admissible(NORMAL_RECV));
        state.board.announce(Direction::Receive);
        assert!(!state.admissible(HIGH_RECV));
    }

    #[test]
    fn drained_bus_allows_direction_change() {
        let mut state = state(3);
        state.admit(NORMAL_SEND);
        state.release();
        assert!(state.admissible(NORMAL_RECV));
        state.admit(NORMAL_RECV);
        assert_eq!(state.snapshot().direction, Some(Direction::Receive));
        assert_eq!(state.snapshot().direction_switches, 1);
    }

    #[test]
    fn announcement_blocks_normal_tasks_of_both_directions() {
        let mut state = state(3);
        state.board.announce(Direction::Send);
        assert!(!state.admissible(NORMAL_SEND));
        assert!(!state.admissible(NORMAL_RECV));
        assert!(state.admissible(HIGH_SEND));
        assert!(state.admissible(HIGH_RECV));

        state.admit(HIGH_SEND);
        assert_eq!(state.board.total(), 0);
        assert!(state.admissible(NORMAL_SEND));
        assert!(!state.admissible(NORMAL_RECV));
    }

    #[test]
    fn any_high_task_of_the_direction_consumes_an_announcement() {
        let mut state = state(3);
        state.board.announce(Direction::Send);
        state.board.announce(Direction::Send);

        state.admit(HIGH_SEND);
        assert_eq!(state.board.waiting(Direction::Send), 1);
        assert!(!state.admissible(NORMAL_SEND));
        assert!(state.admissible(HIGH_SEND));

        state.admit(HIGH_SEND);
        assert_eq!(state.board.total(), 0);
        assert!(state.admissible(NORMAL_SEND));
        assert_eq!(state.snapshot().occupied(), 2);
    }

    #[test]
    fn full_bus_rejects_same_direction() {
        let mut state = state(2);
        state.admit(NORMAL_SEND);
        state.admit(NORMAL_SEND);
        assert!(!state.admissible(NORMAL_SEND));
        state.board.announce(Direction::Send);
        assert!(!state.admissible(HIGH_SEND));
        state.release();
        assert!(state.admissible(HIGH_SEND));
    }

    #[test]
    fn snapshot_tracks_counters() {
        let mut state = state(3);
        state.admit(NORMAL_SEND);
        state.admit(NORMAL_SEND);
        state.release();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.free_slots, 2);
        assert_eq!(snapshot.occupied(), 1);
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.peak_occupancy, 2);
        assert_eq!(snapshot.direction, Some(Direction::Send));
        state.release();
        assert_eq!(state.snapshot().direction, None);
        assert_eq!(state.completed(), 2);
    }
}
