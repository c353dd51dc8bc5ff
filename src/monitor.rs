use std::io::Write;

use chrono::Local;
use color_eyre::Result;
use tracing::{info, warn};

use crate::advisor::Advisor;
use crate::advisor::transport::Transport;
use crate::config::DisplayConfig;
use crate::format::{format_advisory, format_processes, format_system};
use crate::scheduler::Tasks;
use crate::system::collector::Collector;
use crate::system::filter::top_by_cpu;
use crate::system::source::MetricsSource;

/// Credentialed advisor. Absent when no API key is configured.
pub struct Advisory<T> {
    pub advisor: Advisor<T>,
    pub api_key: String,
}

/// Report texts produced by one collection.
#[derive(Clone, Debug)]
pub struct Reading {
    pub system_text: String,
    pub process_text: String,
}

pub struct Monitor<S, T, W> {
    collector: Collector<S>,
    advisory: Option<Advisory<T>>,
    display: DisplayConfig,
    out: W,
    current: Option<Reading>,
    advisory_failures: u64,
}

impl<S: MetricsSource, T: Transport, W: Write> Monitor<S, T, W> {
    pub fn new(
        collector: Collector<S>,
        advisory: Option<Advisory<T>>,
        display: DisplayConfig,
        out: W,
    ) -> Self {
        Monitor {
            collector,
            advisory,
            display,
            out,
            current: None,
            advisory_failures: 0,
        }
    }

    pub fn advisory_failures(&self) -> u64 {
        self.advisory_failures
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn process_sample(&self) -> usize {
        self.advisory
            .as_ref()
            .map_or(0, |a| a.advisor.config().process_sample)
    }

    fn read(&mut self) -> Reading {
        let (snapshot, processes) = self.collector.collect_all();
        let busiest = top_by_cpu(processes, self.process_sample());
        Reading {
            system_text: format_system(&snapshot),
            process_text: format_processes(&busiest, &self.display),
        }
    }

    /// Ask for an advisory on `reading`. Advisory failures are reported to the
    /// output and returned as `Ok(false)`; only output errors propagate.
    pub fn analyze(&mut self, reading: &Reading) -> Result<bool> {
        let Some(advisory) = self.advisory.as_ref() else {
            return Ok(false);
        };

        writeln!(self.out, "[{}] Sending data to AI for analysis...", timestamp())?;
        match advisory.advisor.advise(
            &reading.system_text,
            &reading.process_text,
            &advisory.api_key,
        ) {
            Ok(advice) => {
                write!(self.out, "\n{}", format_advisory(&advice))?;
                Ok(true)
            }
            Err(err) => {
                self.advisory_failures += 1;
                warn!(error = %err, failures = self.advisory_failures, "advisory failed");
                writeln!(self.out, "Error during AI analysis: {err}")?;
                Ok(false)
            }
        }
    }

    /// One-shot: print the system block, then request a single advisory.
    pub fn run_once(&mut self) -> Result<bool> {
        let reading = self.read();
        write!(self.out, "{}", reading.system_text)?;
        self.out.flush()?;
        self.analyze(&reading)
    }
}

impl<S: MetricsSource, T: Transport, W: Write> Tasks for Monitor<S, T, W> {
    fn begin_tick(&mut self) {
        self.current = None;
    }

    fn metrics(&mut self) -> Result<()> {
        // process rows only feed the advisory
        let reading = if self.advisory.is_some() {
            Some(self.read())
        } else {
            None
        };
        let system_text = match &reading {
            Some(reading) => reading.system_text.clone(),
            None => format_system(&self.collector.collect_system()),
        };

        writeln!(self.out, "[{}] Collected system data.", timestamp())?;
        write!(self.out, "{system_text}")?;
        self.out.flush()?;
        self.current = reading;
        Ok(())
    }

    fn advisory(&mut self) -> Result<()> {
        if self.advisory.is_none() {
            info!("no API key configured, advisory skipped");
            return Ok(());
        }
        let reading = match self.current.take() {
            Some(reading) => reading,
            None => self.read(),
        };
        self.analyze(&reading)?;
        self.out.flush()?;
        Ok(())
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
