//! Per-panel view-models.
//!
//! Each builder is a pure projection of the current snapshot (plus whatever
//! view state it needs). Builders that can meet inconsistent data return a
//! [`PanelError`]; the UI renders a fault card for that panel only.

use thiserror::Error;

use crate::format::{format_bytes, format_duration, format_frequency, format_percent, format_speed, percent_of};
use crate::models::{MetricsSnapshot, ProcessRecord};
use crate::preferences::Preferences;
use crate::state::{Identity, Resource};

pub const WAITING_MESSAGE: &str = "Waiting for first sample...";
const LOADING: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("memory in use ({used} B) exceeds total ({total} B)")]
    MemoryOverflow { used: u64, total: u64 },
    #[error("disk {name} reports {usage}% usage")]
    DiskUsageOutOfRange { name: String, usage: f32 },
    #[error("GPU {name} reports {usage}% utilization")]
    GpuUsageOutOfRange { name: String, usage: f32 },
}

fn check_pct(usage: f32) -> bool {
    usage.is_finite() && (0.0..=100.0).contains(&usage)
}

// ─── DASHBOARD ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuThresholds {
    pub moderate: f32,
    pub high: f32,
}

impl Default for CpuThresholds {
    fn default() -> Self {
        Self {
            moderate: 50.0,
            high: 80.0,
        }
    }
}

impl From<&Preferences> for CpuThresholds {
    fn from(prefs: &Preferences) -> Self {
        Self {
            moderate: prefs.cpu_moderate_threshold,
            high: prefs.cpu_high_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStatus {
    Normal,
    Moderate,
    High,
}

impl CpuStatus {
    /// Normal up to and including `moderate`, High strictly above `high`.
    pub fn classify(cpu: f32, t: CpuThresholds) -> Self {
        if cpu > t.high {
            CpuStatus::High
        } else if cpu > t.moderate {
            CpuStatus::Moderate
        } else {
            CpuStatus::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CpuStatus::Normal => "Normal",
            CpuStatus::Moderate => "Moderate",
            CpuStatus::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeModel {
    pub greeting: String,
    pub host_line: String,
}

pub fn welcome(identity: &Identity) -> WelcomeModel {
    match identity {
        Identity::Loading => WelcomeModel {
            greeting: format!("Welcome, {LOADING}"),
            host_line: format!("{LOADING} • {LOADING}"),
        },
        Identity::Known(id) => WelcomeModel {
            greeting: format!("Welcome, {}", id.username),
            host_line: format!("{} • {}", id.hostname, id.os),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuCardModel {
    pub percent: f32,
    pub status: CpuStatus,
}

pub fn cpu_card(snap: &MetricsSnapshot, thresholds: CpuThresholds) -> CpuCardModel {
    CpuCardModel {
        percent: snap.cpu_usage,
        status: CpuStatus::classify(snap.cpu_usage, thresholds),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCardModel {
    pub percent: f32,
    pub used_total: String,
}

fn check_memory(snap: &MetricsSnapshot) -> Result<(), PanelError> {
    if snap.ram_used > snap.ram_total {
        return Err(PanelError::MemoryOverflow {
            used: snap.ram_used,
            total: snap.ram_total,
        });
    }
    Ok(())
}

pub fn memory_card(snap: &MetricsSnapshot) -> Result<MemoryCardModel, PanelError> {
    check_memory(snap)?;
    Ok(MemoryCardModel {
        percent: percent_of(snap.ram_used, snap.ram_total),
        used_total: format!("{} / {}", format_bytes(snap.ram_used), format_bytes(snap.ram_total)),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkCardModel {
    pub download: String,
    pub upload: String,
}

pub fn network_card(snap: &MetricsSnapshot) -> NetworkCardModel {
    NetworkCardModel {
        download: format_speed(snap.net_rx_speed),
        upload: format_speed(snap.net_tx_speed),
    }
}

// ─── RESOURCES ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarEntry {
    pub resource: Resource,
    pub label: &'static str,
    pub sublabel: String,
    pub value: String,
}

pub fn sidebar(snap: &MetricsSnapshot) -> Vec<SidebarEntry> {
    Resource::ALL
        .iter()
        .map(|&resource| {
            let (sublabel, value) = match resource {
                Resource::Cpu => (
                    if snap.cpu_name.is_empty() {
                        "Processor".to_string()
                    } else {
                        snap.cpu_name.clone()
                    },
                    format!("{:.0}%", snap.cpu_usage),
                ),
                Resource::Memory => (
                    format!("{}/{}", format_bytes(snap.ram_used), format_bytes(snap.ram_total)),
                    format!("{:.0}%", percent_of(snap.ram_used, snap.ram_total)),
                ),
                Resource::Disk => match snap.disks.first() {
                    Some(d) => (format!("{} ({})", d.name, d.kind), format!("{:.0}%", d.usage)),
                    None => ("No disks".to_string(), "--".to_string()),
                },
                Resource::Network => (
                    match snap.networks.len() {
                        1 => "1 interface".to_string(),
                        n => format!("{n} interfaces"),
                    },
                    format_speed(snap.net_rx_speed.saturating_add(snap.net_tx_speed)),
                ),
                Resource::Gpu => match snap.gpus.first() {
                    Some(g) => (g.name.clone(), format!("{:.0}%", g.usage)),
                    None => ("Not detected".to_string(), "--".to_string()),
                },
            };
            SidebarEntry {
                resource,
                label: resource.label(),
                sublabel,
                value,
            }
        })
        .collect()
}

/// A label/value line in a detail panel.
pub type Stat = (&'static str, String);

#[derive(Debug, Clone, PartialEq)]
pub struct CpuDetailModel {
    pub name: String,
    pub usage_label: String,
    pub performance: Vec<Stat>,
    pub system: Vec<Stat>,
}

pub fn cpu_detail(snap: &MetricsSnapshot) -> CpuDetailModel {
    CpuDetailModel {
        name: snap.cpu_name.clone(),
        usage_label: format_percent(snap.cpu_usage),
        performance: vec![
            ("Utilization", format_percent(snap.cpu_usage)),
            ("Speed", format_frequency(snap.cpu_frequency_mhz)),
            ("Processes", snap.process_count().to_string()),
        ],
        system: vec![
            ("Uptime", format_duration(snap.uptime_secs)),
            (
                "Cores",
                if snap.cpu_cores == 0 {
                    "--".to_string()
                } else {
                    snap.cpu_cores.to_string()
                },
            ),
        ],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDetailModel {
    pub total_label: String,
    pub percent: f32,
    pub stats: Vec<Stat>,
}

pub fn memory_detail(snap: &MetricsSnapshot) -> Result<MemoryDetailModel, PanelError> {
    check_memory(snap)?;
    let percent = percent_of(snap.ram_used, snap.ram_total);
    let mut stats = vec![
        ("In use", format_bytes(snap.ram_used)),
        ("Free", format_bytes(snap.ram_free)),
        ("Usage", format!("{:.0}%", percent)),
    ];
    if snap.swap_total > 0 {
        stats.push((
            "Swap",
            format!("{} / {}", format_bytes(snap.swap_used), format_bytes(snap.swap_total)),
        ));
    }
    Ok(MemoryDetailModel {
        total_label: format_bytes(snap.ram_total),
        percent,
        stats,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskRow {
    pub name: String,
    pub kind: String,
    pub usage: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskDetailModel {
    pub disks: Vec<DiskRow>,
    pub read: String,
    pub write: String,
}

pub fn disk_detail(snap: &MetricsSnapshot) -> Result<DiskDetailModel, PanelError> {
    let disks = snap
        .disks
        .iter()
        .map(|d| {
            if !check_pct(d.usage) {
                return Err(PanelError::DiskUsageOutOfRange {
                    name: d.name.clone(),
                    usage: d.usage,
                });
            }
            Ok(DiskRow {
                name: d.name.clone(),
                kind: d.kind.clone(),
                usage: d.usage,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DiskDetailModel {
        disks,
        read: format_speed(snap.disk_read_speed),
        write: format_speed(snap.disk_write_speed),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkDetailModel {
    pub download: String,
    pub upload: String,
    pub interfaces: Vec<(String, String)>,
}

pub fn network_detail(snap: &MetricsSnapshot) -> NetworkDetailModel {
    NetworkDetailModel {
        download: format_speed(snap.net_rx_speed),
        upload: format_speed(snap.net_tx_speed),
        interfaces: snap
            .networks
            .iter()
            .map(|n| (n.name.clone(), format_speed(n.speed)))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuRow {
    pub name: String,
    pub usage: f32,
    /// `None` when the backend reports no memory figures.
    pub memory: Option<String>,
}

pub fn gpu_detail(snap: &MetricsSnapshot) -> Result<Vec<GpuRow>, PanelError> {
    snap.gpus
        .iter()
        .map(|g| {
            if !check_pct(g.usage) {
                return Err(PanelError::GpuUsageOutOfRange {
                    name: g.name.clone(),
                    usage: g.usage,
                });
            }
            Ok(GpuRow {
                name: g.name.clone(),
                usage: g.usage,
                memory: (g.memory_total > 0).then(|| {
                    format!("{} / {}", format_bytes(g.memory_used), format_bytes(g.memory_total))
                }),
            })
        })
        .collect()
}

// ─── PROCESSES ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessHeaderModel {
    pub avg_cpu: String,
    pub total_memory: String,
    pub count: String,
}

/// Header statistics always cover the full, unfiltered list.
pub fn process_header(snap: &MetricsSnapshot) -> ProcessHeaderModel {
    let procs = &snap.all_processes;
    let avg = procs.iter().fold(0.0f32, |acc, p| acc + p.cpu) / procs.len().max(1) as f32;
    let memory = procs.iter().map(|p| p.memory).fold(0u64, u64::saturating_add);
    ProcessHeaderModel {
        avg_cpu: format!("{:.0}%", avg),
        total_memory: format_bytes(memory),
        count: procs.len().to_string(),
    }
}

/// Coloring bucket for a process row's CPU column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLoad {
    Idle,
    Busy,
    Hot,
}

impl RowLoad {
    pub fn of(cpu: f32) -> Self {
        if cpu > 50.0 {
            RowLoad::Hot
        } else if cpu > 10.0 {
            RowLoad::Busy
        } else {
            RowLoad::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub initial: char,
    pub cpu: String,
    pub load: RowLoad,
    pub memory: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessTableModel {
    pub rows: Vec<ProcessRow>,
    /// Matching rows past the row limit.
    pub hidden: usize,
    pub empty_message: Option<&'static str>,
}

/// Rows for an already filtered and sorted view, capped at `row_limit`.
pub fn process_table(view: &[ProcessRecord], query: &str, row_limit: usize) -> ProcessTableModel {
    let rows = view
        .iter()
        .take(row_limit)
        .map(|p| ProcessRow {
            pid: p.pid,
            name: p.name.clone(),
            initial: p
                .name
                .chars()
                .next()
                .and_then(|c| c.to_uppercase().next())
                .unwrap_or('?'),
            cpu: format!("{:.0}%", p.cpu),
            load: RowLoad::of(p.cpu),
            memory: format_bytes(p.memory),
        })
        .collect();
    let empty_message = view.is_empty().then(|| {
        if query.is_empty() {
            "Loading processes..."
        } else {
            "No processes found"
        }
    });
    ProcessTableModel {
        rows,
        hidden: view.len().saturating_sub(row_limit),
        empty_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{process, snapshot};
    use crate::models::{DiskRecord, GpuRecord, SystemIdentity};

    #[test]
    fn test_cpu_status_thresholds() {
        let t = CpuThresholds::default();
        assert_eq!(CpuStatus::classify(0.0, t), CpuStatus::Normal);
        assert_eq!(CpuStatus::classify(50.0, t), CpuStatus::Normal);
        assert_eq!(CpuStatus::classify(50.1, t), CpuStatus::Moderate);
        assert_eq!(CpuStatus::classify(80.0, t), CpuStatus::Moderate);
        assert_eq!(CpuStatus::classify(80.5, t), CpuStatus::High);

        let custom = CpuThresholds { moderate: 20.0, high: 40.0 };
        assert_eq!(CpuStatus::classify(30.0, custom), CpuStatus::Moderate);
    }

    #[test]
    fn test_welcome_loading_and_known() {
        let loading = welcome(&Identity::Loading);
        assert_eq!(loading.greeting, "Welcome, Loading...");
        assert_eq!(loading.host_line, "Loading... • Loading...");

        let known = welcome(&Identity::Known(SystemIdentity::fallback()));
        assert_eq!(known.greeting, "Welcome, User");
        assert_eq!(known.host_line, "PC • windows");
    }

    #[test]
    fn test_memory_card() {
        let card = memory_card(&snapshot(10.0)).unwrap();
        assert!((card.percent - 25.0).abs() < 0.01);
        assert_eq!(card.used_total, "4.0 GB / 16.0 GB");
    }

    #[test]
    fn test_memory_overflow_is_isolated() {
        let mut snap = snapshot(10.0);
        snap.ram_used = snap.ram_total + 1;
        assert!(matches!(memory_card(&snap), Err(PanelError::MemoryOverflow { .. })));
        assert!(memory_detail(&snap).is_err());
        // unrelated panels still build
        assert_eq!(cpu_card(&snap, CpuThresholds::default()).status, CpuStatus::Normal);
        assert_eq!(network_card(&snap).download, "2.0 KB/s");
        assert_eq!(sidebar(&snap).len(), 5);
    }

    #[test]
    fn test_disk_and_gpu_range_checks() {
        let mut snap = snapshot(10.0);
        snap.disks.push(DiskRecord {
            name: "/".into(),
            kind: "SSD".into(),
            usage: 120.0,
        });
        assert!(matches!(disk_detail(&snap), Err(PanelError::DiskUsageOutOfRange { .. })));

        snap.gpus.push(GpuRecord {
            name: "gpu0".into(),
            usage: f32::NAN,
            memory_used: 0,
            memory_total: 0,
        });
        assert!(matches!(gpu_detail(&snap), Err(PanelError::GpuUsageOutOfRange { .. })));
        assert!(cpu_detail(&snap).performance.len() == 3);
    }

    #[test]
    fn test_gpu_rows() {
        let mut snap = snapshot(10.0);
        snap.gpus.push(GpuRecord {
            name: "AMD (amdgpu)".into(),
            usage: 37.0,
            memory_used: 1024 * 1024 * 1024,
            memory_total: 4 * 1024 * 1024 * 1024,
        });
        let rows = gpu_detail(&snap).unwrap();
        assert_eq!(rows[0].memory.as_deref(), Some("1.0 GB / 4.0 GB"));
        assert!(gpu_detail(&snapshot(1.0)).unwrap().is_empty());
    }

    #[test]
    fn test_sidebar_entries() {
        let entries = sidebar(&snapshot(42.4));
        let labels: Vec<_> = entries.iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["CPU", "Memory", "Disk", "Network", "GPU"]);
        assert_eq!(entries[0].sublabel, "Test CPU");
        assert_eq!(entries[0].value, "42%");
        assert_eq!(entries[1].sublabel, "4.0 GB/16.0 GB");
        assert_eq!(entries[1].value, "25%");
        assert_eq!(entries[4].sublabel, "Not detected");
    }

    #[test]
    fn test_cpu_detail_stats() {
        let detail = cpu_detail(&snapshot(12.5));
        assert_eq!(detail.usage_label, "12.5%");
        assert_eq!(detail.performance[1], ("Speed", "3.20 GHz".to_string()));
        assert_eq!(detail.performance[2], ("Processes", "2".to_string()));
        assert_eq!(detail.system[0], ("Uptime", "2h 0m".to_string()));
    }

    #[test]
    fn test_memory_detail_reports_free_memory() {
        let mut snap = snapshot(0.0);
        snap.ram_free = 2048;
        let detail = memory_detail(&snap).unwrap();
        assert!(detail.stats.contains(&("Free", "2.0 KB".to_string())));
    }

    #[test]
    fn test_process_header_uses_full_list() {
        let header = process_header(&snapshot(0.0));
        assert_eq!(header.count, "2");
        assert_eq!(header.avg_cpu, "6%");

        let mut empty = snapshot(0.0);
        empty.all_processes.clear();
        let header = process_header(&empty);
        assert_eq!(header.avg_cpu, "0%");
        assert_eq!(header.total_memory, "0 B");
    }

    #[test]
    fn test_process_table_rows_and_limit() {
        let view = vec![
            process(1, "firefox", 60.0, 1024),
            process(2, "cargo", 20.0, 2048),
            process(3, "bash", 1.0, 0),
        ];
        let table = process_table(&view, "", 2);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.hidden, 1);
        assert_eq!(table.rows[0].initial, 'F');
        assert_eq!(table.rows[0].load, RowLoad::Hot);
        assert_eq!(table.rows[1].load, RowLoad::Busy);
        assert_eq!(table.rows[1].memory, "2.0 KB");
        assert!(table.empty_message.is_none());
    }

    #[test]
    fn test_process_table_empty_states() {
        assert_eq!(process_table(&[], "", 10).empty_message, Some("Loading processes..."));
        assert_eq!(process_table(&[], "zzz", 10).empty_message, Some("No processes found"));
    }

    #[test]
    fn test_row_load_buckets() {
        assert_eq!(RowLoad::of(10.0), RowLoad::Idle);
        assert_eq!(RowLoad::of(10.5), RowLoad::Busy);
        assert_eq!(RowLoad::of(50.0), RowLoad::Busy);
        assert_eq!(RowLoad::of(75.0), RowLoad::Hot);
    }
}
