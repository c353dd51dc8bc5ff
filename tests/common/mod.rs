#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use aimon::advisor::AdvisoryError;
use aimon::advisor::transport::{HttpReply, Transport};
use aimon::scheduler::{Sleeper, StopFlag};
use aimon::system::process::ProcessRecord;
use aimon::system::snapshot::{DiskUsage, NetworkTotals};
use aimon::system::source::{CpuReading, MemoryReading, MetricsSource, SampleScope};
use serde::Serialize;

pub const MB: u64 = 1024 * 1024;

pub fn record(pid: u32, name: &str, cpu: f32, mem_mb: u64) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: name.to_string(),
        user: Some("tester".to_string()),
        cpu_percent: cpu,
        memory_bytes: mem_mb * MB,
        cmdline: vec![format!("/usr/bin/{name}"), "--daemon".to_string()],
        cpu_time_ms: u64::from(pid) * 1000,
    }
}

/// Synthetic host with a fixed process table.
pub struct FakeSource {
    pub processes: Vec<ProcessRecord>,
    pub samples: Rc<Cell<usize>>,
    pub scopes: Rc<RefCell<Vec<SampleScope>>>,
}

impl FakeSource {
    pub fn new(processes: Vec<ProcessRecord>) -> Self {
        FakeSource {
            processes,
            samples: Rc::new(Cell::new(0)),
            scopes: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl MetricsSource for FakeSource {
    fn sample(&mut self, scope: SampleScope, _window: Duration) {
        self.samples.set(self.samples.get() + 1);
        self.scopes.borrow_mut().push(scope);
    }

    fn cpu(&self) -> CpuReading {
        CpuReading {
            overall_percent: 42.0,
            per_core_percent: vec![40.0, 44.0],
        }
    }

    fn memory(&self) -> MemoryReading {
        MemoryReading {
            total: 16 * 1024 * MB,
            used: 4 * 1024 * MB,
            available: 12 * 1024 * MB,
            swap_total: 0,
            swap_used: 0,
        }
    }

    fn disks(&self) -> Vec<DiskUsage> {
        vec![DiskUsage {
            mount_point: "/".to_string(),
            total_bytes: 100 * 1024 * MB,
            available_bytes: 50 * 1024 * MB,
        }]
    }

    fn network(&self) -> NetworkTotals {
        NetworkTotals {
            bytes_sent: 1000,
            bytes_received: 2000,
        }
    }

    fn pids(&self) -> Vec<u32> {
        self.processes.iter().map(|p| p.pid).collect()
    }

    fn process(&self, pid: u32) -> Option<ProcessRecord> {
        self.processes.iter().find(|p| p.pid == pid).cloned()
    }
}

/// Answers every request with the same status and body and counts calls.
pub struct CannedTransport {
    pub status: u16,
    pub body: String,
    pub calls: Rc<Cell<usize>>,
}

impl CannedTransport {
    pub fn new(status: u16, body: &str) -> Self {
        CannedTransport {
            status,
            body: body.to_string(),
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl Transport for CannedTransport {
    fn post_json<B: Serialize>(
        &self,
        _url: &str,
        _bearer: &str,
        _body: &B,
    ) -> Result<HttpReply, AdvisoryError> {
        self.calls.set(self.calls.get() + 1);
        Ok(HttpReply {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Virtual clock: each sleep advances time instantly and stops the loop once
/// `limit` is reached.
pub struct VirtualSleeper {
    pub now: Rc<Cell<Duration>>,
    pub limit: Duration,
}

impl VirtualSleeper {
    pub fn until(limit: Duration) -> Self {
        VirtualSleeper {
            now: Rc::new(Cell::new(Duration::ZERO)),
            limit,
        }
    }
}

impl Sleeper for VirtualSleeper {
    fn sleep(&mut self, base: Duration, stop: &StopFlag) -> u64 {
        let now = self.now.get() + base;
        self.now.set(now);
        if now >= self.limit {
            stop.request_stop();
        }
        1
    }
}
