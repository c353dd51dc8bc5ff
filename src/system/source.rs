use std::thread;
use std::time::Duration;

use sysinfo::{
    Disks, MINIMUM_CPU_UPDATE_INTERVAL, Networks, Pid, ProcessRefreshKind, ProcessesToUpdate,
    System, UpdateKind, Users,
};

use super::process::ProcessRecord;
use super::snapshot::{DiskUsage, NetworkTotals};

/// Which counters a call to [`MetricsSource::sample`] must refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleScope {
    System,
    Processes,
    All,
}

impl SampleScope {
    fn system(self) -> bool {
        matches!(self, SampleScope::System | SampleScope::All)
    }

    fn processes(self) -> bool {
        matches!(self, SampleScope::Processes | SampleScope::All)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CpuReading {
    pub overall_percent: f32,
    pub per_core_percent: Vec<f32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryReading {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

/// Read-only view of the operating system's counters.
///
/// `sample` is the only method allowed to block; every accessor reads what the
/// last sample captured.
pub trait MetricsSource {
    fn sample(&mut self, scope: SampleScope, window: Duration);
    fn cpu(&self) -> CpuReading;
    fn memory(&self) -> MemoryReading;
    fn disks(&self) -> Vec<DiskUsage>;
    fn network(&self) -> NetworkTotals;
    fn pids(&self) -> Vec<u32>;
    /// Detail read for one PID. `None` when the process is gone.
    fn process(&self, pid: u32) -> Option<ProcessRecord>;
}

pub struct SysinfoSource {
    sys: System,
    users: Users,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        SysinfoSource {
            sys: System::new(),
            users: Users::new(),
        }
    }

    fn refresh_processes(&mut self) {
        let kind = ProcessRefreshKind::nothing()
            .with_cpu()
            .with_memory()
            .with_cmd(UpdateKind::OnlyIfNotSet)
            .with_user(UpdateKind::OnlyIfNotSet);
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
    }

    fn refresh(&mut self, scope: SampleScope) {
        if scope.system() {
            self.sys.refresh_cpu_usage();
        }
        if scope.processes() {
            self.refresh_processes();
        }
    }

    fn user_name(&self, process: &sysinfo::Process) -> Option<String> {
        let uid = process.user_id()?;
        match self.users.get_user_by_id(uid) {
            Some(user) => Some(user.name().to_string()),
            None => Some(uid_text(uid)),
        }
    }
}

/// Bare numeric id for accounts missing from the user database.
#[cfg(unix)]
fn uid_text(uid: &sysinfo::Uid) -> String {
    (**uid).to_string()
}

#[cfg(not(unix))]
fn uid_text(uid: &sysinfo::Uid) -> String {
    let debug = format!("{uid:?}");
    match debug.strip_prefix("Uid(").and_then(|s| s.strip_suffix(')')) {
        Some(inner) => inner.to_string(),
        None => debug,
    }
}

impl MetricsSource for SysinfoSource {
    fn sample(&mut self, scope: SampleScope, window: Duration) {
        // CPU usage is a delta between two refreshes at least this far apart.
        let window = window.max(MINIMUM_CPU_UPDATE_INTERVAL);
        self.refresh(scope);
        thread::sleep(window);
        self.refresh(scope);

        if scope.system() {
            self.sys.refresh_memory();
        }
        if scope.processes() {
            self.users = Users::new_with_refreshed_list();
        }
    }

    fn cpu(&self) -> CpuReading {
        CpuReading {
            overall_percent: self.sys.global_cpu_usage(),
            per_core_percent: self.sys.cpus().iter().map(|c| c.cpu_usage()).collect(),
        }
    }

    fn memory(&self) -> MemoryReading {
        MemoryReading {
            total: self.sys.total_memory(),
            used: self.sys.used_memory(),
            available: self.sys.available_memory(),
            swap_total: self.sys.total_swap(),
            swap_used: self.sys.used_swap(),
        }
    }

    fn disks(&self) -> Vec<DiskUsage> {
        let disks = Disks::new_with_refreshed_list();
        let mut out: Vec<DiskUsage> = disks
            .list()
            .iter()
            .map(|disk| DiskUsage {
                mount_point: disk.mount_point().to_string_lossy().to_string(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect();
        out.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
        out.dedup_by(|a, b| a.mount_point == b.mount_point);
        out
    }

    fn network(&self) -> NetworkTotals {
        let networks = Networks::new_with_refreshed_list();
        networks
            .list()
            .values()
            .fold(NetworkTotals::default(), |acc, data| NetworkTotals {
                bytes_sent: acc.bytes_sent.saturating_add(data.total_transmitted()),
                bytes_received: acc.bytes_received.saturating_add(data.total_received()),
            })
    }

    fn pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.sys.processes().keys().map(|p| p.as_u32()).collect();
        pids.sort_unstable();
        pids
    }

    fn process(&self, pid: u32) -> Option<ProcessRecord> {
        let process = self.sys.process(Pid::from_u32(pid))?;
        Some(ProcessRecord {
            pid,
            name: process.name().to_string_lossy().to_string(),
            user: self.user_name(process),
            cpu_percent: process.cpu_usage(),
            memory_bytes: process.memory(),
            cmdline: process
                .cmd()
                .iter()
                .map(|s| s.to_string_lossy().to_string())
                .collect(),
            cpu_time_ms: process.accumulated_cpu_time(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysinfo_source_sees_current_process() {
        let mut source = SysinfoSource::new();
        source.sample(SampleScope::Processes, Duration::ZERO);
        let pid = std::process::id();
        assert!(source.pids().contains(&pid));
        let me = source.process(pid).expect("current process missing");
        assert_eq!(me.pid, pid);
        assert!(me.memory_bytes > 0);
    }

    #[test]
    fn system_sample_reports_memory() {
        let mut source = SysinfoSource::new();
        source.sample(SampleScope::System, Duration::ZERO);
        let memory = source.memory();
        assert!(memory.total > 0);
        assert!(memory.used <= memory.total);
        assert!(!source.cpu().per_core_percent.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unresolved_uid_prints_as_plain_number() {
        let mut source = SysinfoSource::new();
        source.sample(SampleScope::Processes, Duration::ZERO);
        let process = source
            .sys
            .process(Pid::from_u32(std::process::id()))
            .expect("current process missing");
        let uid = process.user_id().expect("current process has no uid");
        let text = uid_text(uid);
        assert!(!text.is_empty());
        assert!(text.chars().all(|c| c.is_ascii_digit()), "got {text:?}");
    }

    #[test]
    fn unknown_pid_reads_as_gone() {
        let source = SysinfoSource::new();
        assert!(source.process(u32::MAX - 1).is_none());
    }
}
