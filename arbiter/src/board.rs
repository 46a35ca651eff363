//! Announcement board: how many high-priority tasks per direction have
//! declared intent to use the bus but have not been admitted yet.
//!
//! The counters are class-scoped. Any admitted high-priority task of a
//! direction consumes one unit for that direction, whichever task announced it.
use crate::types::Direction;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnouncementBoard {
    waiting: [usize; 2],
}

impl AnnouncementBoard {
    pub fn announce(&mut self, direction: Direction) {
        self.waiting[direction.index()] += 1;
    }

    pub fn withdraw(&mut self, direction: Direction) {
        let count = &mut self.waiting[direction.index()];
        debug_assert!(*count > 0, "withdrawal without announcement");
        *count = count.saturating_sub(1);
    }

    pub fn waiting(&self, direction: Direction) -> usize {
        self.waiting[direction.index()]
    }

    pub fn total(&self) -> usize {
        self.waiting.iter().sum()
    }

    /// At least one high-priority task, of either direction, is pending.
    pub fn any(&self) -> bool {
        self.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_per_direction() {
        let mut board = AnnouncementBoard::default();
        board.announce(Direction::Send);
        board.announce(Direction::Send);
        board.announce(Direction::Receive);
        assert_eq!(board.waiting(Direction::Send), 2);
        assert_eq!(board.waiting(Direction::Receive), 1);
        assert_eq!(board.total(), 3);
    }

    #[test]
    fn withdraw_clears_board() {
        let mut board = AnnouncementBoard::default();
        assert!(!board.any());
        board.announce(Direction::Receive);
        assert!(board.any());
        board.withdraw(Direction::Receive);
        assert!(!board.any());
        assert_eq!(board.waiting(Direction::Receive), 0);
    }
}
