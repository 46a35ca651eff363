use anyhow::{Context, Result};
use arbiter::TracingHook;
use arbiter::hook::TRANSITION_TARGET;
use chrono::{DateTime, Utc};
use clap::Parser;
use config::ast;
use runner::cli::{Cli, OutputDestination, RunArgs};
use runner::{RunCmd, ScheduleReport};
use std::fs::{File, OpenOptions};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing_subscriber::{EnvFilter, filter, fmt, prelude::*};

use crate::output::to_csv;

mod output;

fn main() -> Result<()> {
    let args = Cli::parse();
    match &args.cmd {
        RunCmd::Run(run_args) => run(&args, run_args),
        RunCmd::Logs { logs } => {
            arbiter::log::print_logs(logs)?;
            Ok(())
        }
    }
}

fn run(args: &Cli, run_args: &RunArgs) -> Result<()> {
    let schedule = load_schedule(run_args)?;
    setup_logging(schedule.trace, run_args.log.as_deref())?;
    let report = runner::run(&schedule, Some(Arc::new(TracingHook)))?;
    match args.dest {
        OutputDestination::Stdout => to_csv(stdout(), &report)?,
        OutputDestination::File => {
            let root = make_run_dir(&args.out_dir)?;
            let path = root.join(format!("report.{}", args.fmt.extension()));
            let f = OpenOptions::new().write(true).create_new(true).open(&path)?;
            to_csv(f, &report)?;
            eprintln!("Report: {}", path.display());
        }
    }
    print_summary(&report);
    Ok(())
}

/// Configuration file values, with command-line overrides applied on top.
fn load_schedule(run_args: &RunArgs) -> Result<ast::Schedule> {
    let mut schedule = match &run_args.config {
        Some(path) => config::read(path)?,
        None => config::parse(String::new())?,
    };
    if let Some(capacity) = run_args.capacity {
        schedule.bus.capacity = ast::validate_capacity(capacity)?;
    }
    let tasks = &mut schedule.tasks;
    for (count, arg) in [
        (&mut tasks.normal_send, run_args.normal_send),
        (&mut tasks.normal_receive, run_args.normal_receive),
        (&mut tasks.high_send, run_args.high_send),
        (&mut tasks.high_receive, run_args.high_receive),
    ] {
        if let Some(arg) = arg {
            *count = arg;
        }
    }
    if let Some(seed) = run_args.seed {
        schedule.transfer.seed = seed;
    }
    schedule.trace |= run_args.trace || run_args.log.is_some();
    Ok(schedule)
}

fn print_summary(report: &ScheduleReport) {
    eprintln!("Completed tasks: {}", report.completed);
    eprintln!("Peak occupancy: {}", report.peak_occupancy);
    eprintln!("Direction switches: {}", report.direction_switches);
    eprintln!("Elapsed: {:?}", report.elapsed);
}

fn make_run_dir(out_dir: &Path) -> Result<PathBuf> {
    let datetime: DateTime<Utc> = SystemTime::now().into();
    let datetime = datetime.format("%Y-%m-%d_%H:%M:%S%.3f").to_string();
    let root = out_dir.join(&datetime);
    if !root.exists() {
        std::fs::create_dir_all(&root)
            .context(format!("Unable to create {}", root.display()))?;
    }
    Ok(root)
}

/// Transitions go to the binary log when one is given, otherwise to stderr
/// when tracing is on.
fn setup_logging(trace: bool, log: Option<&Path>) -> Result<()> {
    let logfile = log.map(make_logfile).transpose()?;
    let echo = (trace && logfile.is_none()).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter::filter_fn(|metadata| {
                metadata.target() == TRANSITION_TARGET
            }))
    });
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter::filter_fn(|metadata| {
                    metadata.target() != TRANSITION_TARGET
                }))
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(echo)
        .with(
            arbiter::log::BinaryLogLayer::new(logfile).with_filter(filter::filter_fn(
                |metadata| metadata.target() == TRANSITION_TARGET,
            )),
        )
        .init();
    Ok(())
}

fn make_logfile(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .context(format!("Unable to open log file {}", path.display()))
}
