use std::time::Duration;

use chrono::Utc;
use tracing::{debug, trace};

use super::process::ProcessRecord;
use super::snapshot::SystemSnapshot;
use super::source::{MetricsSource, SampleScope, SysinfoSource};

pub const DEFAULT_SAMPLE_WINDOW: Duration = Duration::from_millis(1000);

pub struct Collector<S = SysinfoSource> {
    source: S,
    window: Duration,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Collector::with_source(SysinfoSource::new(), DEFAULT_SAMPLE_WINDOW)
    }
}

impl<S: MetricsSource> Collector<S> {
    pub fn with_source(source: S, window: Duration) -> Self {
        Collector { source, window }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn collect_system(&mut self) -> SystemSnapshot {
        self.source.sample(SampleScope::System, self.window);
        self.build_system()
    }

    pub fn collect_processes(&mut self) -> Vec<ProcessRecord> {
        self.source.sample(SampleScope::Processes, self.window);
        self.build_processes()
    }

    /// Both readings from a single sampling window.
    pub fn collect_all(&mut self) -> (SystemSnapshot, Vec<ProcessRecord>) {
        self.source.sample(SampleScope::All, self.window);
        (self.build_system(), self.build_processes())
    }

    fn build_system(&self) -> SystemSnapshot {
        let cpu = self.source.cpu();
        let memory = self.source.memory();
        let snapshot = SystemSnapshot {
            captured_at: Utc::now(),
            cpu_usage_percent: cpu.overall_percent,
            per_core_percent: cpu.per_core_percent,
            memory_total: memory.total,
            memory_used: memory.used,
            memory_available: memory.available,
            swap_total: memory.swap_total,
            swap_used: memory.swap_used,
            disks: self.source.disks(),
            network: self.source.network(),
        };
        debug!(
            cpu = snapshot.cpu_usage_percent,
            cores = snapshot.per_core_percent.len(),
            disks = snapshot.disks.len(),
            "collected system snapshot"
        );
        snapshot
    }

    fn build_processes(&self) -> Vec<ProcessRecord> {
        let pids = self.source.pids();
        let mut records = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.source.process(pid) {
                Some(record) => records.push(record),
                None => trace!(pid, "process vanished during collection"),
            }
        }
        debug!(count = records.len(), "collected process table");
        records
    }
}
