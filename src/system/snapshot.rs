use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskUsage {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    pub fn used_percent(&self) -> f64 {
        percent(self.used_bytes(), self.total_bytes)
    }
}

/// Cumulative byte counters summed over every interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkTotals {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SystemSnapshot {
    pub captured_at: DateTime<Utc>,
    pub cpu_usage_percent: f32,
    pub per_core_percent: Vec<f32>,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub disks: Vec<DiskUsage>,
    pub network: NetworkTotals,
}

impl SystemSnapshot {
    pub fn memory_used_percent(&self) -> f64 {
        percent(self.memory_used, self.memory_total)
    }

    pub fn swap_used_percent(&self) -> f64 {
        percent(self.swap_used, self.swap_total)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_usage_derives_used_space() {
        let disk = DiskUsage {
            mount_point: "/".into(),
            total_bytes: 400,
            available_bytes: 100,
        };
        assert_eq!(disk.used_bytes(), 300);
        assert!((disk.used_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_totals_do_not_divide_by_zero() {
        let disk = DiskUsage {
            mount_point: "/sandbox".into(),
            total_bytes: 0,
            available_bytes: 10,
        };
        assert_eq!(disk.used_bytes(), 0);
        assert_eq!(disk.used_percent(), 0.0);
    }
}
