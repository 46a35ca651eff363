use std::{fmt::Display, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub cmd: RunCmd,

    /// How to format the report.
    #[arg(short, long, default_value_t)]
    pub fmt: OutputFormat,

    /// Which destination to use for the report
    #[arg(short, long, default_value_t)]
    pub dest: OutputDestination,

    /// Directory under which timestamped report directories are created
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(ValueEnum, Debug, Default, Clone)]
pub enum OutputFormat {
    #[default]
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(ValueEnum, Debug, Default, Clone)]
pub enum OutputDestination {
    #[default]
    Stdout,
    File,
}

impl Display for OutputDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputDestination::Stdout => f.write_str("stdout"),
            OutputDestination::File => f.write_str("file"),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum RunCmd {
    /// Run tasks against the bus arbiter
    Run(RunArgs),
    /// Print a binary transition log
    Logs { logs: PathBuf },
}

impl Display for RunCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunCmd::Run(_) => write!(f, "run"),
            RunCmd::Logs { .. } => write!(f, "logs"),
        }
    }
}

#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct RunArgs {
    /// Configuration toml file for the schedule
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of bus slots
    #[arg(long, allow_negative_numbers = true)]
    pub capacity: Option<i64>,

    /// Normal-priority sending tasks
    #[arg(long)]
    pub normal_send: Option<u32>,

    /// Normal-priority receiving tasks
    #[arg(long)]
    pub normal_receive: Option<u32>,

    /// High-priority sending tasks
    #[arg(long)]
    pub high_send: Option<u32>,

    /// High-priority receiving tasks
    #[arg(long)]
    pub high_receive: Option<u32>,

    /// Seed for transfer durations
    #[arg(long)]
    pub seed: Option<u64>,

    /// Trace every bus transition
    #[arg(long)]
    pub trace: bool,

    /// Append bus transitions to this binary log file (implies --trace)
    #[arg(long)]
    pub log: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "bus-sched",
            "-d",
            "file",
            "run",
            "--capacity",
            "-1",
            "--normal-send",
            "5",
            "--high-send",
            "1",
            "--log",
            "transitions",
        ])
        .unwrap();
        assert!(matches!(cli.dest, OutputDestination::File));
        let RunCmd::Run(args) = cli.cmd else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.capacity, Some(-1));
        assert_eq!(args.normal_send, Some(5));
        assert_eq!(args.high_send, Some(1));
        assert_eq!(args.normal_receive, None);
        assert_eq!(args.log, Some(PathBuf::from("transitions")));
        assert!(!args.trace);
    }

    #[test]
    fn parses_logs() {
        let cli = Cli::try_parse_from(["bus-sched", "logs", "out/transitions"]).unwrap();
        assert_eq!(
            cli.cmd,
            RunCmd::Logs {
                logs: PathBuf::from("out/transitions")
            }
        );
        assert_eq!(cli.cmd.to_string(), "logs");
    }
}
