use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One process row as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    /// CPU usage in percent, normalized by core count.
    pub cpu: f32,
    /// Resident memory in bytes.
    pub memory: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskRecord {
    pub name: String,
    /// Storage kind as reported by the OS ("SSD", "HDD", "Unknown").
    #[serde(rename = "type")]
    pub kind: String,
    /// Used space in percent.
    pub usage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub name: String,
    /// Combined receive + transmit rate in bytes/s.
    pub speed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuRecord {
    pub name: String,
    /// Utilization in percent.
    pub usage: f32,
    #[serde(default)]
    pub memory_used: u64,
    #[serde(default)]
    pub memory_total: u64,
}

/// A complete set of host metrics, replaced wholesale on every
/// `metrics-update` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cpu_usage: f32,
    pub ram_total: u64,
    pub ram_used: u64,
    pub ram_free: u64,
    pub net_rx_speed: u64,
    pub net_tx_speed: u64,
    /// Older backends only sent a pre-truncated `top_processes` list.
    #[serde(alias = "top_processes")]
    pub all_processes: Vec<ProcessRecord>,

    #[serde(default)]
    pub disk_read_speed: u64,
    #[serde(default)]
    pub disk_write_speed: u64,
    #[serde(default)]
    pub cpu_name: String,
    #[serde(default)]
    pub cpu_cores: usize,
    #[serde(default)]
    pub cpu_frequency_mhz: u64,
    #[serde(default)]
    pub uptime_secs: u64,
    #[serde(default)]
    pub swap_total: u64,
    #[serde(default)]
    pub swap_used: u64,
    #[serde(default)]
    pub disks: Vec<DiskRecord>,
    #[serde(default)]
    pub networks: Vec<NetworkRecord>,
    #[serde(default)]
    pub gpus: Vec<GpuRecord>,
}

/// Reasons an inbound payload is rejected. The coordinator skips the update
/// and keeps the previous snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("malformed metrics payload: {0}")]
    Decode(String),
    #[error("cpu usage {0} is outside 0-100%")]
    CpuOutOfRange(f32),
}

impl MetricsSnapshot {
    /// Decode and validate a raw `metrics-update` payload.
    pub fn from_payload(payload: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            serde_json::from_str(payload).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if !self.cpu_usage.is_finite() || !(0.0..=100.0).contains(&self.cpu_usage) {
            return Err(SnapshotError::CpuOutOfRange(self.cpu_usage));
        }
        Ok(())
    }

    pub fn process_count(&self) -> usize {
        self.all_processes.len()
    }
}

/// Static identity of the host, requested once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemIdentity {
    pub username: String,
    pub hostname: String,
    pub os: String,
}

impl SystemIdentity {
    /// Shown when the backend cannot answer `get_system_info`.
    pub fn fallback() -> Self {
        Self {
            username: "User".into(),
            hostname: "PC".into(),
            os: "windows".into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn process(pid: u32, name: &str, cpu: f32, memory: u64) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: name.into(),
            cpu,
            memory,
        }
    }

    pub fn snapshot(cpu_usage: f32) -> MetricsSnapshot {
        MetricsSnapshot {
            cpu_usage,
            ram_total: 16 * 1_073_741_824,
            ram_used: 4 * 1_073_741_824,
            ram_free: 12 * 1_073_741_824,
            net_rx_speed: 2048,
            net_tx_speed: 1024,
            all_processes: vec![
                process(1, "init", 0.1, 4096),
                process(42, "firefox", 12.5, 512 * 1024 * 1024),
            ],
            disk_read_speed: 0,
            disk_write_speed: 0,
            cpu_name: "Test CPU".into(),
            cpu_cores: 8,
            cpu_frequency_mhz: 3200,
            uptime_secs: 7200,
            swap_total: 0,
            swap_used: 0,
            disks: Vec::new(),
            networks: Vec::new(),
            gpus: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_superset_payload() {
        let snap = fixtures::snapshot(33.0);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"all_processes\""));
        let decoded = MetricsSnapshot::from_payload(&json).unwrap();
        assert_eq!(decoded, snap);
    }

    #[test]
    fn test_decode_legacy_top_processes_payload() {
        let json = r#"{
            "cpu_usage": 12.0, "ram_total": 100, "ram_used": 40, "ram_free": 60,
            "net_rx_speed": 5, "net_tx_speed": 6,
            "top_processes": [{"pid": 7, "name": "sshd", "cpu": 0.5, "memory": 1024}]
        }"#;
        let snap = MetricsSnapshot::from_payload(json).unwrap();
        assert_eq!(snap.all_processes.len(), 1);
        assert_eq!(snap.all_processes[0].name, "sshd");
        assert!(snap.disks.is_empty());
        assert_eq!(snap.cpu_cores, 0);
    }

    #[test]
    fn test_disk_kind_uses_type_key() {
        let json = r#"{"name": "nvme0n1", "type": "SSD", "usage": 41.5}"#;
        let disk: DiskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(disk.kind, "SSD");
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let err = MetricsSnapshot::from_payload(r#"{"cpu_usage": "high"}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));

        let err = MetricsSnapshot::from_payload("not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }

    #[test]
    fn test_cpu_out_of_range_is_rejected() {
        let mut snap = fixtures::snapshot(0.0);
        snap.cpu_usage = 140.0;
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(
            MetricsSnapshot::from_payload(&json),
            Err(SnapshotError::CpuOutOfRange(140.0))
        );
    }

    #[test]
    fn test_identity_fallback_values() {
        let id = SystemIdentity::fallback();
        assert_eq!(id.username, "User");
        assert_eq!(id.hostname, "PC");
        assert_eq!(id.os, "windows");
    }
}
