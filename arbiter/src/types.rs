//! Descriptors carried by every task that competes for the bus.
use std::fmt::Display;

/// Identifier the driver hands to each task it spawns.
pub type TaskId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Send,
    Receive,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Send, Direction::Receive];

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Send => 0,
            Direction::Receive => 1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Send => Direction::Receive,
            Direction::Receive => Direction::Send,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Send => "send",
            Direction::Receive => "receive",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Priority {
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of a task: which way its data moves and which
/// priority class it arbitrates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskDescriptor {
    pub direction: Direction,
    pub priority: Priority,
}

impl TaskDescriptor {
    pub const fn new(direction: Direction, priority: Priority) -> Self {
        Self {
            direction,
            priority,
        }
    }

    pub fn is_high(&self) -> bool {
        self.priority == Priority::High
    }
}

impl Display for TaskDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-priority {}", self.priority, self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_flips_direction() {
        assert_eq!(Direction::Send.opposite(), Direction::Receive);
        assert_eq!(Direction::Receive.opposite(), Direction::Send);
    }

    #[test]
    fn indices_are_distinct() {
        assert_ne!(Direction::Send.index(), Direction::Receive.index());
    }

    #[test]
    fn descriptor_display() {
        let task = TaskDescriptor::new(Direction::Receive, Priority::High);
        assert!(task.is_high());
        assert_eq!(task.to_string(), "high-priority receive");
    }
}
