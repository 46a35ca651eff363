//! Simulated transfers: sleep for a seeded pseudo-random number of ticks.
use std::thread;
use std::time::Duration;

use arbiter::{TaskDescriptor, TaskId, Transfer};
use config::ast::TransferParams;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};

pub struct SleepTransfer {
    rng: Mutex<StdRng>,
    /// Transfers take between 0 and `time - 1` ticks.
    time: u64,
    tick: Duration,
}

impl SleepTransfer {
    pub fn new(time: u64, tick: Duration, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            time,
            tick,
        }
    }

    pub fn from_params(params: &TransferParams) -> Self {
        Self::new(params.time, params.tick_duration(), params.seed)
    }

    /// Draw the length of the next transfer, in ticks.
    pub fn next_ticks(&self) -> u64 {
        if self.time == 0 {
            return 0;
        }
        self.rng.lock().random_range(0..self.time)
    }

    fn duration(&self, ticks: u64) -> Duration {
        let ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.tick.checked_mul(ticks).unwrap_or(Duration::MAX)
    }
}

impl Transfer for SleepTransfer {
    fn transfer(&self, _id: TaskId, _task: TaskDescriptor) -> Duration {
        let duration = self.duration(self.next_ticks());
        thread::sleep(duration);
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter::{Direction, Priority};

    #[test]
    fn same_seed_same_durations() {
        let a = SleepTransfer::new(5, Duration::ZERO, 123456789);
        let b = SleepTransfer::new(5, Duration::ZERO, 123456789);
        let first: Vec<_> = (0..32).map(|_| a.next_ticks()).collect();
        let second: Vec<_> = (0..32).map(|_| b.next_ticks()).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|ticks| *ticks < 5));
    }

    #[test]
    fn zero_transfer_time_never_sleeps() {
        let transfer = SleepTransfer::new(0, Duration::from_secs(1), 1);
        let task = TaskDescriptor::new(Direction::Send, Priority::Normal);
        assert_eq!(transfer.transfer(0, task), Duration::ZERO);
    }

    #[test]
    fn duration_scales_with_tick() {
        let transfer = SleepTransfer::new(5, Duration::from_millis(10), 1);
        assert_eq!(transfer.duration(3), Duration::from_millis(30));
        assert_eq!(transfer.duration(0), Duration::ZERO);
    }
}
