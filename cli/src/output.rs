//! Human-readable rendering shared by the commands.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use portprobe_core::{PortInfo, PortStatus, ProcessInfo};
use serde::Serialize;

pub fn status_symbol(status: PortStatus) -> &'static str {
    match status {
        PortStatus::Free => "✓",
        PortStatus::InUse => "✗",
    }
}

/// Render how long ago `start_time` (epoch seconds) was, relative to `now`.
pub fn format_age(start_time: u64, now: DateTime<Utc>) -> String {
    let Ok(started) = i64::try_from(start_time) else {
        return "unknown".to_string();
    };
    let elapsed = now.timestamp() - started;
    if elapsed < 0 {
        return "unknown".to_string();
    }

    match elapsed {
        0..=59 => format!("{}s ago", elapsed),
        60..=3599 => format!("{}m ago", elapsed / 60),
        3600..=86399 => format!("{}h ago", elapsed / 3600),
        _ => format!("{}d ago", elapsed / 86400),
    }
}

/// Local wall-clock time followed by the relative age.
pub fn format_started(start_time: u64) -> String {
    let age = format_age(start_time, Utc::now());
    match i64::try_from(start_time)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
    {
        Some(at) => format!("{} ({})", at.format("%Y-%m-%d %H:%M:%S"), age),
        None => age,
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_process_lines(process: &ProcessInfo) {
    println!("  Process: {}", process.name);
    println!("  PID: {}", process.pid);
    if let Some(ref token) = process.launch_token {
        println!("  Command: {}", token);
    }
    if let Some(ref user) = process.user {
        println!("  User: {}", user);
    }
    if let Some(started) = process.start_time {
        println!("  Started: {}", format_age(started, Utc::now()));
    }
}

pub fn print_port_info(info: &PortInfo) {
    println!("Port {} is {}", info.port(), info.status());
    if let Some(process) = info.process() {
        print_process_lines(process);
    }
}

pub fn print_detailed_info(info: &PortInfo) {
    println!("Port {} Information:", info.port());
    println!("  Status: {}", info.status());

    let Some(process) = info.process() else {
        return;
    };
    println!("  Process: {}", process.name);
    println!("  PID: {}", process.pid);
    if let Some(ref user) = process.user {
        println!("  User: {}", user);
    }
    if let Some(ref token) = process.launch_token {
        println!("  Command: {}", token);
    }
    if let Some(started) = process.start_time {
        println!("  Started: {}", format_started(started));
    }
}

pub fn port_hint(port: u16) -> Option<&'static str> {
    match port {
        3000 => Some("Commonly used for React/Node"),
        5000 => Some("Common for Flask/Go"),
        8080 => Some("Alternative HTTP port"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_format_age_units() {
        let now = at(1_700_000_000);
        assert_eq!(format_age(1_700_000_000 - 42, now), "42s ago");
        assert_eq!(format_age(1_700_000_000 - 180, now), "3m ago");
        assert_eq!(format_age(1_700_000_000 - 5 * 3600, now), "5h ago");
        assert_eq!(format_age(1_700_000_000 - 2 * 86400, now), "2d ago");
    }

    #[test]
    fn test_format_age_future_is_unknown() {
        let now = at(1_000);
        assert_eq!(format_age(2_000, now), "unknown");
        assert_eq!(format_age(u64::MAX, now), "unknown");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("node", 20), "node");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_status_symbol() {
        assert_eq!(status_symbol(PortStatus::Free), "✓");
        assert_eq!(status_symbol(PortStatus::InUse), "✗");
    }

    #[test]
    fn test_port_hint() {
        assert!(port_hint(3000).is_some());
        assert!(port_hint(8080).is_some());
        assert!(port_hint(3001).is_none());
    }
}
