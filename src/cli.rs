use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

use crate::system::filter::{FilterCriteria, RankBy};

#[derive(Parser, Debug)]
#[command(
    name = "aimon",
    version,
    about = "Monitor system activity and list processes, with periodic AI health advice"
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(false)
        .args(["system", "processes", "top_cpu", "mem_range", "run_in_background", "analyze"])
))]
pub struct Cli {
    /// Show overall system information
    #[arg(long)]
    pub system: bool,

    /// List running processes
    #[arg(long)]
    pub processes: bool,

    /// Filter processes by name (case-insensitive substring)
    #[arg(short = 'n', long = "procname", value_name = "NAME", requires = "processes")]
    pub procname: Option<String>,

    /// Filter processes by command line (case-insensitive substring)
    #[arg(short = 'c', long = "cmdline", value_name = "CMDLINE", requires = "processes")]
    pub cmdline: Option<String>,

    /// Show the top N processes by CPU
    #[arg(long, value_name = "N")]
    pub top_cpu: Option<usize>,

    /// Ranking used by --top-cpu
    #[arg(long, value_enum, requires = "top_cpu")]
    pub rank_by: Option<RankArg>,

    /// Show processes whose resident memory is between LOW and HIGH megabytes
    #[arg(long, num_args = 2, value_names = ["LOW_MB", "HIGH_MB"], allow_negative_numbers = true)]
    pub mem_range: Option<Vec<f64>>,

    /// Run the monitor in a loop and send data to the AI periodically
    #[arg(long)]
    pub run_in_background: bool,

    /// Collect once and request a single AI analysis
    #[arg(long)]
    pub analyze: bool,

    /// Seconds between metric collections in background mode
    #[arg(long, value_name = "SECONDS", requires = "run_in_background")]
    pub interval: Option<u64>,

    /// Seconds between AI analyses in background mode
    #[arg(long, value_name = "SECONDS", requires = "run_in_background")]
    pub ai_interval: Option<u64>,

    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RankArg {
    /// CPU percent over the sampling window
    Percent,
    /// Accumulated CPU time since process start
    Time,
}

impl From<RankArg> for RankBy {
    fn from(arg: RankArg) -> Self {
        match arg {
            RankArg::Percent => RankBy::Percent,
            RankArg::Time => RankBy::Time,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    System,
    Processes(FilterCriteria),
    TopCpu { n: usize, rank: RankBy },
    MemRange { low_mb: f64, high_mb: f64 },
    Background,
    Analyze,
}

impl Cli {
    /// The single mode selected; clap's `mode` group guarantees exactly one.
    pub fn mode(&self) -> Mode {
        if let Some(n) = self.top_cpu {
            return Mode::TopCpu {
                n,
                rank: self.rank_by.map(RankBy::from).unwrap_or_default(),
            };
        }
        if let Some(ref range) = self.mem_range
            && let &[low_mb, high_mb] = range.as_slice()
        {
            return Mode::MemRange { low_mb, high_mb };
        }
        if self.processes {
            return Mode::Processes(FilterCriteria {
                name: self.procname.clone(),
                cmdline: self.cmdline.clone(),
                ..Default::default()
            });
        }
        if self.run_in_background {
            return Mode::Background;
        }
        if self.analyze {
            return Mode::Analyze;
        }
        Mode::System
    }
}
