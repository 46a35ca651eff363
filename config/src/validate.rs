use super::parse;
use crate::helpers::{verify_nonnegative, verify_positive};
use anyhow::{Context, Result, bail};
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

impl Direction {
    fn validate(mut val: parse::DirectionName) -> Result<Self> {
        val.0.make_ascii_lowercase();
        let variant = match val.0.as_str() {
            "send" | "sender" | "tx" => Self::Send,
            "receive" | "receiver" | "rx" => Self::Receive,
            s => {
                bail!("Expected a bus direction (\"send\" or \"receive\") but found \"{s}\"");
            }
        };
        Ok(variant)
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Receive
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitMode {
    /// Block on a condition variable between admission checks.
    #[default]
    Block,
    /// Spin, yielding the processor between admission checks.
    Yield,
}

impl WaitMode {
    fn validate(mut val: parse::WaitMode) -> Result<Self> {
        val.0.make_ascii_lowercase();
        let variant = match val.0.as_str() {
            "block" | "condvar" => Self::Block,
            "yield" | "spin" => Self::Yield,
            s => {
                bail!("Expected a wait mode (\"block\" or \"yield\") but found \"{s}\"");
            }
        };
        Ok(variant)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    fn validate(mut val: parse::Unit) -> Result<Self> {
        val.0.make_ascii_lowercase();
        let variant = match val.0.as_str() {
            "seconds" | "s" => Self::Seconds,
            "milliseconds" | "ms" => Self::Milliseconds,
            "microseconds" | "us" => Self::Microseconds,
            "nanoseconds" | "ns" => Self::Nanoseconds,
            s => {
                bail!("Expected to find a valid time unit but found \"{s}\"");
            }
        };
        Ok(variant)
    }

    pub fn duration(&self, length: u64) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::from_secs(length),
            TimeUnit::Milliseconds => Duration::from_millis(length),
            TimeUnit::Microseconds => Duration::from_micros(length),
            TimeUnit::Nanoseconds => Duration::from_nanos(length),
        }
    }
}

impl Default for TimeUnit {
    fn default() -> Self {
        Self::Milliseconds
    }
}

/// Check a bus capacity coming from outside the config file.
pub fn validate_capacity(val: i64) -> Result<NonZeroUsize> {
    let capacity = verify_positive(val)
        .context("Invalid configuration: bus capacity must be greater than zero")?;
    let capacity = usize::try_from(capacity).context("Bus capacity does not fit in usize")?;
    NonZeroUsize::new(capacity).context("Invalid configuration: bus capacity is zero")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusParams {
    pub capacity: NonZeroUsize,
    pub initial_direction: Direction,
    pub wait: WaitMode,
}

impl Default for BusParams {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            initial_direction: Direction::default(),
            wait: WaitMode::default(),
        }
    }
}

impl BusParams {
    pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(3).unwrap();

    fn validate(val: parse::Bus) -> Result<Self> {
        let capacity = val
            .capacity
            .map(validate_capacity)
            .unwrap_or(Ok(Self::DEFAULT_CAPACITY))?;
        let initial_direction = val
            .initial_direction
            .map(Direction::validate)
            .unwrap_or(Ok(Direction::default()))
            .context("Unable to validate initial bus direction")?;
        let wait = val
            .wait
            .map(WaitMode::validate)
            .unwrap_or(Ok(WaitMode::default()))
            .context("Unable to validate wait mode")?;
        Ok(Self {
            capacity,
            initial_direction,
            wait,
        })
    }
}

/// Simulated transfer durations: each transfer takes a seeded pseudo-random
/// number of ticks in `[0, time)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferParams {
    pub time: u64,
    pub tick: u64,
    pub unit: TimeUnit,
    pub seed: u64,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            time: Self::DEFAULT_TIME,
            tick: Self::DEFAULT_TICK,
            unit: TimeUnit::default(),
            seed: Self::DEFAULT_SEED,
        }
    }
}

impl TransferParams {
    const DEFAULT_TIME: u64 = 5;
    const DEFAULT_TICK: u64 = 10;
    const DEFAULT_SEED: u64 = 123456789;

    pub fn tick_duration(&self) -> Duration {
        self.unit.duration(self.tick)
    }

    fn validate(val: parse::Transfer) -> Result<Self> {
        let time = val
            .time
            .map(verify_nonnegative)
            .unwrap_or(Ok(Self::DEFAULT_TIME))
            .context("Invalid configuration: transfer time must not be negative")?;
        let unit = val
            .unit
            .map(TimeUnit::validate)
            .unwrap_or(Ok(TimeUnit::default()))
            .context("Unable to validate time unit in transfer config")?;
        Ok(Self {
            time,
            tick: val.tick.unwrap_or(Self::DEFAULT_TICK),
            unit,
            seed: val.seed.unwrap_or(Self::DEFAULT_SEED),
        })
    }
}

/// Number of tasks to create in each category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub normal_send: u32,
    pub normal_receive: u32,
    pub high_send: u32,
    pub high_receive: u32,
}

impl TaskCounts {
    pub fn new(normal_send: u32, normal_receive: u32, high_send: u32, high_receive: u32) -> Self {
        Self {
            normal_send,
            normal_receive,
            high_send,
            high_receive,
        }
    }

    pub fn total(&self) -> u64 {
        [
            self.normal_send,
            self.normal_receive,
            self.high_send,
            self.high_receive,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }

    fn validate_count(name: &str, val: Option<i64>) -> Result<u32> {
        let Some(val) = val else {
            return Ok(0);
        };
        let count = verify_nonnegative(val).context(format!(
            "Invalid configuration: task count \"{name}\" must not be negative"
        ))?;
        u32::try_from(count).context(format!("Task count \"{name}\" is too large"))
    }

    fn validate(val: parse::Tasks) -> Result<Self> {
        Ok(Self {
            normal_send: Self::validate_count("normal_send", val.normal_send)?,
            normal_receive: Self::validate_count("normal_receive", val.normal_receive)?,
            high_send: Self::validate_count("high_send", val.high_send)?,
            high_receive: Self::validate_count("high_receive", val.high_receive)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    pub bus: BusParams,
    pub transfer: TransferParams,
    pub tasks: TaskCounts,
    pub trace: bool,
}

impl Schedule {
    pub(crate) fn validate(val: parse::Schedule) -> Result<Self> {
        let bus = val
            .bus
            .map(BusParams::validate)
            .unwrap_or(Ok(BusParams::default()))
            .context("Unable to validate bus parameters")?;
        let transfer = val
            .transfer
            .map(TransferParams::validate)
            .unwrap_or(Ok(TransferParams::default()))
            .context("Unable to validate transfer parameters")?;
        let tasks = val
            .tasks
            .map(TaskCounts::validate)
            .unwrap_or(Ok(TaskCounts::default()))
            .context("Unable to validate task counts")?;
        let trace = val.trace.and_then(|trace| trace.enabled).unwrap_or(false);
        Ok(Self {
            bus,
            transfer,
            tasks,
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn validate(text: &str) -> Result<Schedule> {
        let parsed: parse::Schedule = toml::from_str(text)?;
        Schedule::validate(parsed)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let schedule = validate("").unwrap();
        assert_eq!(schedule, Schedule::default());
        assert_eq!(schedule.bus.capacity.get(), 3);
        assert_eq!(schedule.bus.initial_direction, Direction::Receive);
        assert_eq!(schedule.transfer.time, 5);
        assert_eq!(schedule.transfer.seed, 123456789);
        assert_eq!(schedule.transfer.tick_duration(), Duration::from_millis(10));
        assert_eq!(schedule.tasks.total(), 0);
        assert!(!schedule.trace);
    }

    #[test]
    fn full_config() {
        let schedule = validate(
            r#"
            [bus]
            capacity = 4
            initial_direction = "Send"
            wait = "yield"

            [transfer]
            time = 8
            tick = 250
            unit = "us"
            seed = 7

            [tasks]
            normal_send = 5
            high_send = 1
            high_receive = 2

            [trace]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(
            schedule,
            Schedule {
                bus: BusParams {
                    capacity: NonZeroUsize::new(4).unwrap(),
                    initial_direction: Direction::Send,
                    wait: WaitMode::Yield,
                },
                transfer: TransferParams {
                    time: 8,
                    tick: 250,
                    unit: TimeUnit::Microseconds,
                    seed: 7,
                },
                tasks: TaskCounts::new(5, 0, 1, 2),
                trace: true,
            }
        );
        assert_eq!(schedule.tasks.total(), 8);
        assert_eq!(
            schedule.transfer.tick_duration(),
            Duration::from_micros(250)
        );
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = validate("[bus]\ncapacity = 0").unwrap_err();
        assert!(format!("{err:#}").contains("capacity must be greater than zero"));
        assert!(validate("[bus]\ncapacity = -2").is_err());
    }

    #[test]
    fn negative_task_count_is_rejected() {
        let err = validate("[tasks]\nhigh_receive = -1").unwrap_err();
        assert!(format!("{err:#}").contains("\"high_receive\" must not be negative"));
    }

    #[test]
    fn unknown_fields_and_names_are_rejected() {
        assert!(validate("[bus]\nlanes = 2").is_err());
        assert!(validate("[bus]\ninitial_direction = \"sideways\"").is_err());
        assert!(validate("[bus]\nwait = \"sleep\"").is_err());
        assert!(validate("[transfer]\nunit = \"fortnights\"").is_err());
        assert!(validate("[transfer]\ntime = -5").is_err());
    }

    #[test]
    fn validate_capacity_bounds() {
        assert_eq!(validate_capacity(1).unwrap().get(), 1);
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(-3).is_err());
    }
}
