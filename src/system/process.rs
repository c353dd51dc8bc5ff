#[derive(Clone, Debug, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub user: Option<String>,
    pub cpu_percent: f32,
    pub memory_bytes: u64,
    pub cmdline: Vec<String>,
    /// Accumulated user + system CPU time in milliseconds.
    pub cpu_time_ms: u64,
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

impl ProcessRecord {
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / BYTES_PER_MB
    }

    /// Arguments joined with single spaces, the form matched by cmdline filters.
    pub fn command_line(&self) -> String {
        self.cmdline.join(" ")
    }
}
