//! GPU sampling for the `gpus` field of a snapshot.
//!
//! On Linux the DRM cards under `/sys/class/drm` are read first (AMD and
//! Intel expose usage and memory there, NVIDIA mostly does not), then
//! `nvidia-smi` fills the gaps. Elsewhere `nvidia-smi` is the only source.
//! Nothing found means an empty list.

use std::process::Command;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::models::GpuRecord;

const MIB: u64 = 1024 * 1024;

pub fn collect_gpus() -> Vec<GpuRecord> {
    #[cfg(target_os = "linux")]
    {
        let mut gpus = drm::cards();
        if !gpus.is_empty() {
            fill_from_smi(&mut gpus);
            return gpus;
        }
    }

    SMI.query()
}

/// Complete NVIDIA entries that sysfs left blank, pairing them with
/// nvidia-smi rows in order.
#[cfg(target_os = "linux")]
fn fill_from_smi(gpus: &mut [GpuRecord]) {
    let incomplete = |g: &GpuRecord| g.name.contains("NVIDIA") && (g.memory_total == 0 || g.usage == 0.0);
    if !gpus.iter().any(incomplete) {
        return;
    }

    let nvidia = gpus.iter_mut().filter(|g| g.name.contains("NVIDIA"));
    for (gpu, row) in nvidia.zip(SMI.query()) {
        if !row.name.is_empty() {
            gpu.name = row.name;
        }
        if gpu.usage == 0.0 {
            gpu.usage = row.usage;
        }
        if gpu.memory_total == 0 {
            (gpu.memory_used, gpu.memory_total) = (row.memory_used, row.memory_total);
        }
    }
}

// ─── nvidia-smi ────────────────────────────────────────────────

/// Last nvidia-smi answer. Spawning the tool on every 1s sample is too
/// costly, so rows are reused for `ttl`.
struct SmiCache {
    ttl: Duration,
    last: RwLock<Option<(Instant, Vec<GpuRecord>)>>,
}

static SMI: SmiCache = SmiCache {
    ttl: Duration::from_secs(5),
    last: RwLock::new(None),
};

impl SmiCache {
    fn query(&self) -> Vec<GpuRecord> {
        {
            let last = self.last.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((at, rows)) = last.as_ref() {
                if at.elapsed() < self.ttl {
                    return rows.clone();
                }
            }
        }

        let rows = run_nvidia_smi();
        *self.last.write().unwrap_or_else(PoisonError::into_inner) = Some((Instant::now(), rows.clone()));
        rows
    }
}

fn run_nvidia_smi() -> Vec<GpuRecord> {
    let result = Command::new("nvidia-smi")
        .arg("--query-gpu=name,utilization.gpu,memory.used,memory.total")
        .arg("--format=csv,noheader,nounits")
        .output();

    match result {
        Ok(out) if out.status.success() => parse_nvidia_smi(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::trace!(status = %out.status, "nvidia-smi failed");
            Vec::new()
        }
        // not installed
        Err(_) => Vec::new(),
    }
}

/// One GPU per CSV row: name, utilization %, used MiB, total MiB.
/// Unparseable numbers read as zero; rows with fewer than four fields or no
/// name are dropped.
fn parse_nvidia_smi(stdout: &str) -> Vec<GpuRecord> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(',').map(str::trim);
            let name = fields.next().filter(|n| !n.is_empty())?;
            let (usage, used, total) = (fields.next()?, fields.next()?, fields.next()?);
            let mib = |s: &str| s.parse::<u64>().map_or(0, |m| m * MIB);
            Some(GpuRecord {
                name: name.to_owned(),
                usage: usage.parse::<f32>().map_or(0.0, |u| u.clamp(0.0, 100.0)),
                memory_used: mib(used),
                memory_total: mib(total),
            })
        })
        .collect()
}

fn vendor_name(pci_vendor: &str) -> &'static str {
    match pci_vendor {
        "0x10de" => "NVIDIA",
        "0x1002" => "AMD",
        "0x8086" => "Intel",
        _ => "GPU",
    }
}

// ─── sysfs ─────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
mod drm {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::vendor_name;
    use crate::models::GpuRecord;

    /// `cardN` directories only; connectors such as `card0-DP-1` are skipped.
    fn is_card(name: &str) -> bool {
        name.strip_prefix("card")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    }

    pub(super) fn cards() -> Vec<GpuRecord> {
        let Ok(dir) = fs::read_dir("/sys/class/drm") else {
            return Vec::new();
        };
        dir.flatten()
            .filter(|e| is_card(&e.file_name().to_string_lossy()))
            .map(|e| e.path())
            .filter(|card| card.join("device").is_dir())
            .map(|card| read_card(&card))
            .collect()
    }

    fn read_card(card: &Path) -> GpuRecord {
        let device: PathBuf = card.join("device");
        let (memory_used, memory_total) = memory(card, &device);
        GpuRecord {
            name: name(&device),
            // amdgpu only
            usage: read(&device.join("gpu_busy_percent"))
                .and_then(|v| v.parse::<f32>().ok())
                .map_or(0.0, |pct| pct.clamp(0.0, 100.0)),
            memory_used,
            memory_total,
        }
    }

    fn read(path: &Path) -> Option<String> {
        fs::read_to_string(path).ok().map(|s| s.trim().to_owned())
    }

    fn read_u64(path: &Path) -> Option<u64> {
        read(path)?.parse().ok()
    }

    /// Board label if present, else "<vendor> (<driver>)", else the card
    /// directory name.
    fn name(device: &Path) -> String {
        if let Some(label) = read(&device.join("label")) {
            return label;
        }
        let driver = read(&device.join("uevent"))
            .and_then(|ev| ev.lines().find_map(|l| l.strip_prefix("DRIVER=").map(str::to_owned)));
        if let Some(driver) = driver {
            let vendor = read(&device.join("vendor")).unwrap_or_default();
            return format!("{} ({driver})", vendor_name(&vendor));
        }
        device
            .parent()
            .and_then(Path::file_name)
            .map_or_else(|| "Unknown GPU".to_owned(), |n| n.to_string_lossy().into_owned())
    }

    /// (used, total) in bytes. AMD reports both; Intel only a total.
    fn memory(card: &Path, device: &Path) -> (u64, u64) {
        match (
            read_u64(&device.join("mem_info_vram_used")),
            read_u64(&device.join("mem_info_vram_total")),
        ) {
            (Some(used), Some(total)) => (used, total),
            _ => (0, read_u64(&card.join("gt_total_memory")).unwrap_or(0)),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_is_card() {
            assert!(is_card("card0"));
            assert!(is_card("card12"));
            assert!(!is_card("card0-DP-1"));
            assert!(!is_card("card"));
            assert!(!is_card("renderD128"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collected_usage_is_a_percentage() {
        for gpu in collect_gpus() {
            assert!((0.0..=100.0).contains(&gpu.usage), "{gpu:?}");
        }
    }

    #[test]
    fn test_parse_nvidia_smi() {
        let gpus = parse_nvidia_smi("NVIDIA GeForce RTX 3060, 41, 2048, 12288\nTesla T4, 0, 0, 15360\n");
        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].name, "NVIDIA GeForce RTX 3060");
        assert_eq!(gpus[0].usage, 41.0);
        assert_eq!(gpus[0].memory_used, 2 * 1024 * MIB);
        assert_eq!(gpus[0].memory_total, 12 * 1024 * MIB);
        assert_eq!(gpus[1].memory_total, 15360 * MIB);
    }

    #[test]
    fn test_parse_nvidia_smi_tolerates_garbage() {
        let gpus = parse_nvidia_smi("broken line\n, 1, 2, 3\nTesla T4, [N/A], 10, x\n");
        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].usage, 0.0);
        assert_eq!(gpus[0].memory_used, 10 * MIB);
        assert_eq!(gpus[0].memory_total, 0);
    }

    #[test]
    fn test_vendor_name() {
        assert_eq!(vendor_name("0x10de"), "NVIDIA");
        assert_eq!(vendor_name("0x1002"), "AMD");
        assert_eq!(vendor_name("0xffff"), "GPU");
    }
}
