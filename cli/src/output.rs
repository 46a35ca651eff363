use csv::Writer;
use runner::ScheduleReport;
use std::io::Write;

#[derive(Debug, serde::Serialize)]
pub struct TaskRecord<'a> {
    id: u64,
    direction: &'a str,
    priority: &'a str,
    sequence: u64,
    checks: u64,
    waited_us: u64,
    transfer_us: u64,
}

pub fn to_csv(w: impl Write, report: &ScheduleReport) -> csv::Result<()> {
    let mut wr = Writer::from_writer(w);
    for task in &report.tasks {
        wr.serialize(TaskRecord {
            id: task.id,
            direction: task.direction.as_str(),
            priority: task.priority.as_str(),
            sequence: task.sequence,
            checks: task.checks,
            waited_us: micros(task.waited),
            transfer_us: micros(task.transfer),
        })?;
    }
    wr.flush()?;
    Ok(())
}

fn micros(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter::{Direction, Priority, TaskSummary};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn writes_one_row_per_task() {
        let report = ScheduleReport {
            completed: 2,
            tasks: vec![
                TaskSummary {
                    id: 0,
                    direction: Direction::Send,
                    priority: Priority::High,
                    sequence: 1,
                    checks: 1,
                    waited: Duration::from_micros(12),
                    transfer: Duration::from_millis(20),
                },
                TaskSummary {
                    id: 1,
                    direction: Direction::Receive,
                    priority: Priority::Normal,
                    sequence: 2,
                    checks: 3,
                    waited: Duration::from_millis(21),
                    transfer: Duration::ZERO,
                },
            ],
            peak_occupancy: 1,
            direction_switches: 1,
            elapsed: Duration::from_millis(45),
        };
        let mut buf = vec![];
        to_csv(&mut buf, &report).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "id,direction,priority,sequence,checks,waited_us,transfer_us\n\
             0,send,high,1,1,12,20000\n\
             1,receive,normal,2,3,21000,0\n"
        );
    }
}
