use std::fmt::Write;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::DisplayConfig;
use crate::system::filter::RankBy;
use crate::system::process::ProcessRecord;
use crate::system::snapshot::SystemSnapshot;

const USER_WIDTH: usize = 12;

pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

/// Truncate to `width` columns, then pad with spaces to exactly `width`.
fn fit_unicode(s: &str, width: usize) -> String {
    let mut out = truncate_unicode(s, width);
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat_n(' ', pad));
    out
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.0} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_system(snapshot: &SystemSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- System Information ---");
    let _ = writeln!(
        out,
        "Captured: {}",
        snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "CPU Usage: {:.1}%", snapshot.cpu_usage_percent);
    if !snapshot.per_core_percent.is_empty() {
        let cores: Vec<String> = snapshot
            .per_core_percent
            .iter()
            .map(|c| format!("{c:.1}%"))
            .collect();
        let _ = writeln!(
            out,
            "CPU Cores ({}): {}",
            cores.len(),
            cores.join(" ")
        );
    }
    let _ = writeln!(
        out,
        "Memory: {} used / {} total ({:.1}%), {} available",
        format_bytes(snapshot.memory_used),
        format_bytes(snapshot.memory_total),
        snapshot.memory_used_percent(),
        format_bytes(snapshot.memory_available),
    );
    let _ = writeln!(
        out,
        "Swap: {} used / {} total ({:.1}%)",
        format_bytes(snapshot.swap_used),
        format_bytes(snapshot.swap_total),
        snapshot.swap_used_percent(),
    );
    if snapshot.disks.is_empty() {
        let _ = writeln!(out, "Disk: unavailable");
    }
    for disk in &snapshot.disks {
        let _ = writeln!(
            out,
            "Disk {}: {} used / {} total ({:.1}%)",
            disk.mount_point,
            format_bytes(disk.used_bytes()),
            format_bytes(disk.total_bytes),
            disk.used_percent(),
        );
    }
    let _ = writeln!(out, "Network Sent (bytes): {}", snapshot.network.bytes_sent);
    let _ = writeln!(
        out,
        "Network Received (bytes): {}",
        snapshot.network.bytes_received
    );
    out
}

pub fn format_processes(records: &[ProcessRecord], display: &DisplayConfig) -> String {
    render_processes(records, display, false)
}

/// Process table with an extra TIME column showing accumulated CPU time, for
/// listings ranked by it.
pub fn format_processes_by_time(records: &[ProcessRecord], display: &DisplayConfig) -> String {
    render_processes(records, display, true)
}

/// Table for a top-N listing; CPU-time rankings show the value they rank by.
pub fn format_top(records: &[ProcessRecord], display: &DisplayConfig, rank: RankBy) -> String {
    match rank {
        RankBy::Percent => format_processes(records, display),
        RankBy::Time => format_processes_by_time(records, display),
    }
}

pub fn format_cpu_time(ms: u64) -> String {
    format!("{:.2}s", ms as f64 / 1000.0)
}

fn render_processes(records: &[ProcessRecord], display: &DisplayConfig, show_time: bool) -> String {
    if records.is_empty() {
        return "No processes found matching criteria.\n".to_string();
    }

    let mut out = String::new();
    let time_header = if show_time {
        format!("  {:>10}", "TIME")
    } else {
        String::new()
    };
    let _ = writeln!(
        out,
        "{:>7}  {}  {}  {:>6}{}  {:>9}  COMMAND",
        "PID",
        fit_unicode("NAME", display.name_width),
        fit_unicode("USER", USER_WIDTH),
        "CPU%",
        time_header,
        "MEMORY",
    );
    for record in records {
        let user = record.user.as_deref().unwrap_or("-");
        let command = single_line(&record.command_line());
        let command = if command.is_empty() {
            "-".to_string()
        } else {
            truncate_unicode(&command, display.cmdline_width)
        };
        let time = if show_time {
            format!("  {:>10}", format_cpu_time(record.cpu_time_ms))
        } else {
            String::new()
        };
        let row = format!(
            "{:>7}  {}  {}  {:>5.1}%{}  {:>9}  {}",
            record.pid,
            fit_unicode(&record.name, display.name_width),
            fit_unicode(user, USER_WIDTH),
            record.cpu_percent,
            time,
            format_bytes(record.memory_bytes),
            command,
        );
        let _ = writeln!(out, "{}", row.trim_end());
    }
    out
}

pub fn format_advisory(advice: &str) -> String {
    format!(
        "--- AI Analysis and Advice ---\n{}\n--- End of AI Analysis ---\n",
        advice.trim_end()
    )
}

fn single_line(s: &str) -> String {
    s.replace('\r', "").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::system::snapshot::{DiskUsage, NetworkTotals};

    fn snapshot() -> SystemSnapshot {
        SystemSnapshot {
            captured_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            cpu_usage_percent: 12.34,
            per_core_percent: vec![10.0, 14.68],
            memory_total: 8 * 1024 * 1024 * 1024,
            memory_used: 2 * 1024 * 1024 * 1024,
            memory_available: 6 * 1024 * 1024 * 1024,
            swap_total: 0,
            swap_used: 0,
            disks: vec![DiskUsage {
                mount_point: "/".into(),
                total_bytes: 100 * 1024 * 1024 * 1024,
                available_bytes: 60 * 1024 * 1024 * 1024,
            }],
            network: NetworkTotals {
                bytes_sent: 1234,
                bytes_received: 5678,
            },
        }
    }

    #[test]
    fn system_block_has_labeled_lines() {
        let text = format_system(&snapshot());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "--- System Information ---",
                "Captured: 2024-03-01 12:30:00 UTC",
                "CPU Usage: 12.3%",
                "CPU Cores (2): 10.0% 14.7%",
                "Memory: 2.0 GB used / 8.0 GB total (25.0%), 6.0 GB available",
                "Swap: 0 B used / 0 B total (0.0%)",
                "Disk /: 40.0 GB used / 100.0 GB total (40.0%)",
                "Network Sent (bytes): 1234",
                "Network Received (bytes): 5678",
            ]
        );
    }

    #[test]
    fn system_block_without_disks() {
        let mut snap = snapshot();
        snap.disks.clear();
        snap.per_core_percent.clear();
        let text = format_system(&snap);
        assert!(text.contains("Disk: unavailable\n"));
        assert!(!text.contains("CPU Cores"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let snap = snapshot();
        assert_eq!(format_system(&snap), format_system(&snap));
    }

    #[test]
    fn empty_process_list_message() {
        assert_eq!(
            format_processes(&[], &DisplayConfig::default()),
            "No processes found matching criteria.\n"
        );
    }

    #[test]
    fn process_command_line_is_flattened_and_truncated() {
        let record = ProcessRecord {
            pid: 9,
            name: "sh".into(),
            user: None,
            cpu_percent: 0.0,
            memory_bytes: 0,
            cmdline: vec!["sh".into(), "-c".into(), "echo a\necho b".into()],
            cpu_time_ms: 0,
        };
        let display = DisplayConfig {
            name_width: 4,
            cmdline_width: 12,
        };
        let text = format_processes(&[record], &display);
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, "      9  sh    -               0.0%        0 B  sh -c echo \u{2026}");
    }

    #[test]
    fn time_column_shows_seconds() {
        let record = ProcessRecord {
            pid: 9,
            name: "sh".into(),
            user: Some("root".into()),
            cpu_percent: 2.0,
            memory_bytes: 0,
            cmdline: vec!["sh".into()],
            cpu_time_ms: 83_450,
        };
        let display = DisplayConfig {
            name_width: 4,
            cmdline_width: 12,
        };
        let text = format_processes_by_time(&[record.clone()], &display);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "    PID  NAME  USER            CPU%        TIME     MEMORY  COMMAND");
        assert_eq!(lines[1], "      9  sh    root            2.0%      83.45s        0 B  sh");
        assert_eq!(format_top(&[record.clone()], &display, RankBy::Time), text);
        assert!(!format_top(&[record], &display, RankBy::Percent).contains("TIME"));
    }

    #[test]
    fn cpu_time_in_seconds() {
        assert_eq!(format_cpu_time(0), "0.00s");
        assert_eq!(format_cpu_time(1_500), "1.50s");
        assert_eq!(format_cpu_time(3_600_000), "3600.00s");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate_unicode("hello", 10), "hello");
        assert_eq!(truncate_unicode("hello world", 6), "hello\u{2026}");
        assert_eq!(fit_unicode("ab", 4), "ab  ");
    }

    #[test]
    fn advisory_block_is_framed() {
        assert_eq!(
            format_advisory("All normal.\n"),
            "--- AI Analysis and Advice ---\nAll normal.\n--- End of AI Analysis ---\n"
        );
    }
}
