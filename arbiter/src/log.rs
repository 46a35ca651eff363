use bincode::error::DecodeError;
use bincode::{Decode, Encode, config, encode_into_std_write};
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use parking_lot::Mutex;
use tracing::field::Visit;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::errors::LogError;

/// One transition as stored in a binary transition log.
#[derive(Encode, Decode, Debug, Default, Clone, PartialEq)]
pub struct TransitionRecord {
    pub task: u64,
    pub kind: String,
    pub direction: String,
    pub priority: String,
    pub free_slots: u64,
    pub waiting_send: u64,
    pub waiting_receive: u64,
}

impl Display for TransitionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {:>4} {:<8} {:<6} {:<7} free={} waiting(send={}, receive={})",
            self.task,
            self.kind,
            self.priority,
            self.direction,
            self.free_slots,
            self.waiting_send,
            self.waiting_receive
        )
    }
}

#[derive(Debug, Default, PartialEq)]
struct LogVisitor {
    record: TransitionRecord,
}

impl Visit for LogVisitor {
    fn record_debug(&mut self, _: &tracing::field::Field, _: &dyn std::fmt::Debug) {}

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        match field.name() {
            "task" => {
                self.record.task = value;
            }
            "free_slots" => {
                self.record.free_slots = value;
            }
            "waiting_send" => {
                self.record.waiting_send = value;
            }
            "waiting_receive" => {
                self.record.waiting_receive = value;
            }
            _ => {}
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "kind" => {
                self.record.kind = value.to_string();
            }
            "direction" => {
                self.record.direction = value.to_string();
            }
            "priority" => {
                self.record.priority = value.to_string();
            }
            _ => {}
        }
    }
}

/// Appends every event it sees to a file as a bincode [`TransitionRecord`].
/// Install it behind a filter on [`crate::hook::TRANSITION_TARGET`].
pub struct BinaryLogLayer(Option<Mutex<File>>);

impl BinaryLogLayer {
    pub fn new(file: Option<File>) -> Self {
        Self(file.map(Mutex::new))
    }
}

impl<S: Subscriber> Layer<S> for BinaryLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(ref lock) = self.0 else {
            return;
        };
        let mut visitor = LogVisitor::default();
        event.record(&mut visitor);
        let mut file = lock.lock();
        if let Err(e) = append(&mut *file, visitor.record) {
            eprintln!("{e}");
        }
    }
}

fn append(w: &mut impl Write, record: TransitionRecord) -> Result<(), LogError> {
    encode_into_std_write(record, &mut *w, config::standard()).map_err(LogError::Encode)?;
    w.flush().map_err(LogError::Flush)
}

pub fn read_logs(log: impl AsRef<Path>) -> Result<Vec<TransitionRecord>, LogError> {
    let mut src = BufReader::new(File::open(log).map_err(LogError::Open)?);
    let mut records = vec![];
    loop {
        let config = config::standard();
        match bincode::decode_from_reader::<TransitionRecord, _, _>(&mut src, config) {
            Ok(record) => records.push(record),
            Err(DecodeError::Io { inner, .. }) if inner.kind() == io::ErrorKind::UnexpectedEof => {
                break Ok(records);
            }
            Err(e) => break Err(LogError::Decode(e)),
        }
    }
}

pub fn print_logs(log: impl AsRef<Path>) -> Result<(), LogError> {
    for record in read_logs(log)? {
        println!("{record}");
    }
    Ok(())
}
