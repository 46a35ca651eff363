use bincode::error::{DecodeError, EncodeError};
use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArbiterError {
    #[error("Invalid bus configuration: {0}")]
    InvalidConfiguration(ConfigurationError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("bus capacity must be greater than zero")]
    ZeroCapacity,
}

impl From<ConfigurationError> for ArbiterError {
    fn from(val: ConfigurationError) -> Self {
        ArbiterError::InvalidConfiguration(val)
    }
}

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Error found opening transition log file: `{0:#?}`")]
    Open(io::Error),
    #[error("Error found decoding transition log file: `{0:#?}`")]
    Decode(DecodeError),
    #[error("Unable to append transition record: {0}")]
    Encode(EncodeError),
    #[error("Unable to flush transition log: {0}")]
    Flush(io::Error),
}

/// Broken invariant found while auditing a recorded transition stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Task {task} admitted with {occupied} tasks on a bus of capacity {capacity}")]
    CapacityExceeded {
        task: u64,
        occupied: usize,
        capacity: usize,
    },
    #[error("Task {task} admitted while tasks of the opposite direction hold the bus")]
    MixedDirections { task: u64 },
    #[error("Normal-priority task {task} admitted while {waiting} high-priority tasks wait")]
    NormalBeforeHigh { task: u64, waiting: usize },
    #[error("Task {task} admitted twice")]
    DoubleAdmission { task: u64 },
    #[error("Task {task} released without holding a slot")]
    ReleaseWithoutAdmission { task: u64 },
    #[error("Task {task} never released its slot")]
    Unreleased { task: u64 },
    #[error("Permits not conserved after task {task}: {held} held, {free} free, capacity {capacity}")]
    PermitLeak {
        task: u64,
        held: usize,
        free: usize,
        capacity: usize,
    },
}
