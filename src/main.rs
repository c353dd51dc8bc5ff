use std::io::stdout;
use std::time::Duration;

use aimon::advisor::transport::HttpTransport;
use aimon::advisor::{Advisor, api_key_from_env};
use aimon::cli::{Cli, Mode};
use aimon::config::{Config, load_config, load_config_from_path};
use aimon::format::{format_processes, format_system, format_top};
use aimon::logging;
use aimon::monitor::{Advisory, Monitor};
use aimon::scheduler::{self, Schedule, StopFlag, WallClockSleeper};
use aimon::system::collector::Collector;
use aimon::system::filter::{RankBy, filter, in_memory_range, top_by};
use aimon::system::source::SysinfoSource;
use clap::Parser;
use color_eyre::Result;
use tracing::{info, warn};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_json)?;
    let config = load_config_for_cli(&cli);
    let mut collector = Collector::with_source(
        SysinfoSource::new(),
        Duration::from_millis(config.general.sample_interval_ms),
    );

    match cli.mode() {
        Mode::System => {
            print!("{}", format_system(&collector.collect_system()));
        }
        Mode::Processes(criteria) => {
            let processes = filter(collector.collect_processes(), &criteria);
            println!("--- Running Processes ---");
            print!("{}", format_processes(&processes, &config.display));
        }
        Mode::TopCpu { n, rank } => {
            let label = match rank {
                RankBy::Percent => "CPU Usage",
                RankBy::Time => "CPU Time",
            };
            let processes = top_by(collector.collect_processes(), n, rank);
            println!("--- Top {n} Processes by {label} ---");
            print!("{}", format_top(&processes, &config.display, rank));
        }
        Mode::MemRange { low_mb, high_mb } => {
            let processes = in_memory_range(collector.collect_processes(), low_mb, high_mb);
            println!("--- Processes Using {low_mb:.2}MB to {high_mb:.2}MB Memory (RSS) ---");
            print!("{}", format_processes(&processes, &config.display));
        }
        Mode::Analyze => {
            let advisory = build_advisory(&config)?;
            let mut monitor = Monitor::new(collector, advisory, config.display, stdout());
            monitor.run_once()?;
        }
        Mode::Background => run_background(collector, &config)?,
    }

    Ok(())
}

fn run_background(collector: Collector, config: &Config) -> Result<()> {
    let schedule = Schedule::new(config.general.interval_secs, config.general.ai_interval_secs)?;
    let stop = StopFlag::new();
    scheduler::install_interrupt_handler(stop.clone())?;

    println!("Running system monitor in background (Ctrl+C to stop)...");
    let advisory = build_advisory(config)?;
    let mut monitor = Monitor::new(collector, advisory, config.display.clone(), stdout());
    let summary = scheduler::run(schedule, &mut monitor, &mut WallClockSleeper::default(), &stop)?;

    info!(?summary, failures = monitor.advisory_failures(), "background monitor finished");
    println!("\nBackground monitoring stopped by user.");
    Ok(())
}

/// `None` (after a printed warning) when no usable API key is configured.
fn build_advisory(config: &Config) -> Result<Option<Advisory<HttpTransport>>> {
    let api_key = match api_key_from_env(&config.advisor.api_key_env) {
        Ok(key) => key,
        Err(err) => {
            warn!(error = %err, "AI analysis disabled");
            println!("Warning: {err}. AI analysis will be skipped.");
            return Ok(None);
        }
    };
    let advisor = Advisor::new(config.advisor.clone())?;
    Ok(Some(Advisory { advisor, api_key }))
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match cli.config {
        Some(ref path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.interval {
        config.general.interval_secs = interval;
    }
    if let Some(ai_interval) = cli.ai_interval {
        config.general.ai_interval_secs = ai_interval;
    }

    config
}
