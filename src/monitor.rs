//! Backend sampler: reads host metrics with `sysinfo` and publishes one
//! `metrics-update` event per refresh interval over the [`EventBridge`].

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use sysinfo::{
    CpuRefreshKind, DiskKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind, RefreshKind,
    System,
};
use thiserror::Error;

use crate::bridge::{EventBridge, GET_SYSTEM_INFO, METRICS_EVENT};
use crate::format::percent_of;
use crate::models::{DiskRecord, MetricsSnapshot, NetworkRecord, ProcessRecord, SystemIdentity};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentityError {
    #[error("cannot determine the current user: {0}")]
    UnknownUser(String),
}

/// Username, hostname and OS of the machine running the sampler. The
/// username comes from the account database, not the environment.
pub fn system_identity() -> Result<SystemIdentity, IdentityError> {
    let username = whoami::fallible::username()
        .map_err(|e| IdentityError::UnknownUser(e.to_string()))?;
    Ok(SystemIdentity {
        username,
        hostname: whoami::fallible::hostname().unwrap_or_else(|_| "Unknown Host".into()),
        os: std::env::consts::OS.to_string(),
    })
}

/// Install the command handlers the UI may invoke.
pub fn register_commands(bridge: &EventBridge) {
    bridge.register_command(GET_SYSTEM_INFO, || {
        let identity = system_identity().map_err(|e| e.to_string())?;
        serde_json::to_value(identity).map_err(|e| e.to_string())
    });
}

fn disk_kind_label(kind: DiskKind) -> &'static str {
    match kind {
        DiskKind::SSD => "SSD",
        DiskKind::HDD => "HDD",
        _ => "Unknown",
    }
}

/// Bytes counted over `elapsed`, as a per-second rate.
fn per_second(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 / secs) as u64
    } else {
        0
    }
}

pub struct Sampler {
    sys: System,
    disks: Disks,
    networks: Networks,
    last_sample: Instant,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            last_sample: Instant::now(),
        }
    }

    /// Refresh everything the snapshot needs and build it. Rates are computed
    /// over the time since the previous call.
    pub fn sample(&mut self) -> MetricsSnapshot {
        let proc_refresh = ProcessRefreshKind::new()
            .with_cpu()
            .with_memory()
            .with_disk_usage();
        self.sys.refresh_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything())
                .with_processes(proc_refresh),
        );
        self.networks.refresh();
        self.disks.refresh();

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_sample);
        self.last_sample = now;

        let cpus = self.sys.cpus();
        let cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };
        let num_cpus = cpus.len().max(1) as f32;
        let cpu_name = cpus.first().map(|c| c.brand().trim().to_string()).unwrap_or_default();
        let cpu_frequency_mhz = cpus.first().map(|c| c.frequency()).unwrap_or(0);
        let cpu_cores = cpus.len();

        let (mut rx, mut tx) = (0u64, 0u64);
        let mut networks = Vec::new();
        for (name, data) in self.networks.iter() {
            rx += data.received();
            tx += data.transmitted();
            networks.push(NetworkRecord {
                name: name.clone(),
                speed: per_second(data.received() + data.transmitted(), elapsed),
            });
        }
        networks.sort_by(|a, b| a.name.cmp(&b.name));

        let disks = self
            .disks
            .iter()
            .map(|d| DiskRecord {
                name: d.mount_point().to_string_lossy().to_string(),
                kind: disk_kind_label(d.kind()).to_string(),
                usage: percent_of(
                    d.total_space().saturating_sub(d.available_space()),
                    d.total_space(),
                ),
            })
            .collect();

        let (mut disk_read, mut disk_write) = (0u64, 0u64);
        let mut all_processes = Vec::new();
        for p in self.sys.processes().values() {
            let du = p.disk_usage();
            disk_read += du.read_bytes;
            disk_write += du.written_bytes;
            if p.thread_kind().is_some() {
                continue;
            }
            all_processes.push(ProcessRecord {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().to_string(),
                cpu: p.cpu_usage() / num_cpus,
                memory: p.memory(),
            });
        }
        all_processes.sort_by_key(|p| p.pid);

        let ram_total = self.sys.total_memory();
        let ram_used = self.sys.used_memory().min(ram_total);

        tracing::trace!(
            cpu_usage,
            processes = all_processes.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "sampled host"
        );

        MetricsSnapshot {
            cpu_usage: cpu_usage.clamp(0.0, 100.0),
            ram_total,
            ram_used,
            ram_free: self.sys.free_memory().min(ram_total),
            net_rx_speed: per_second(rx, elapsed),
            net_tx_speed: per_second(tx, elapsed),
            all_processes,
            disk_read_speed: per_second(disk_read, elapsed),
            disk_write_speed: per_second(disk_write, elapsed),
            cpu_name,
            cpu_cores,
            cpu_frequency_mhz,
            uptime_secs: System::uptime(),
            swap_total: self.sys.total_swap(),
            swap_used: self.sys.used_swap(),
            disks,
            networks,
            gpus: crate::gpu::collect_gpus(),
        }
    }
}

/// Owns the sampler thread. Dropping it stops the thread and joins it.
pub struct MonitorHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn stop(&mut self) {
        // Closing the channel wakes the thread out of its wait.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("sampler thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start sampling on a dedicated thread. Each cycle waits `interval` first,
/// then samples and emits, so the first event arrives one interval after
/// start.
pub fn spawn(bridge: EventBridge, interval: Duration) -> std::io::Result<MonitorHandle> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let thread = std::thread::Builder::new()
        .name("nexmon-sampler".into())
        .spawn(move || {
            tracing::info!(interval_secs = interval.as_secs(), "sampler started");
            let mut sampler = Sampler::new();
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let snapshot = sampler.sample();
                if let Err(e) = bridge.emit(METRICS_EVENT, &snapshot) {
                    tracing::warn!(error = %e, "failed to emit metrics");
                }
            }
            tracing::info!("sampler stopped");
        })?;

    Ok(MonitorHandle {
        stop: Some(stop_tx),
        thread: Some(thread),
    })
}
