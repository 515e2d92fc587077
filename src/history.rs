use crate::format::bytes_to_gb;
use crate::models::MetricsSnapshot;
use crate::ringbuf::RingBuffer;

/// Default length of the rolling chart buffers.
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

/// Stored point for a single metric, labelled with its capture time.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryPoint {
    pub label: String,
    pub value: f32,
}

pub type MetricHistory = RingBuffer<HistoryPoint>;

/// The rolling series tracked by the coordinator: CPU % and RAM used (GB).
#[derive(Clone, Debug, PartialEq)]
pub struct History {
    pub cpu: MetricHistory,
    pub ram: MetricHistory,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cpu: RingBuffer::new(capacity),
            ram: RingBuffer::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cpu.capacity()
    }

    /// Record one snapshot: exactly one append per tracked series.
    pub fn record(&self, snap: &MetricsSnapshot, label: &str) -> Self {
        Self {
            cpu: self.cpu.appended(HistoryPoint {
                label: label.to_owned(),
                value: snap.cpu_usage,
            }),
            ram: self.ram.appended(HistoryPoint {
                label: label.to_owned(),
                value: bytes_to_gb(snap.ram_used),
            }),
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Plain values of a series, oldest first (chart and sparkline input).
pub fn values(series: &MetricHistory) -> Vec<f32> {
    series.iter().map(|p| p.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[test]
    fn test_record_appends_once_per_series() {
        let history = History::with_capacity(10);
        let next = history.record(&fixtures::snapshot(25.0), "12:00:00");
        assert_eq!(next.cpu.len(), 1);
        assert_eq!(next.ram.len(), 1);
        assert!(history.cpu.is_empty());

        let cpu = next.cpu.last().unwrap();
        assert_eq!(cpu.label, "12:00:00");
        assert_eq!(cpu.value, 25.0);
        // fixture uses 4 GiB
        assert!((next.ram.last().unwrap().value - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_record_evicts_oldest() {
        let mut history = History::with_capacity(2);
        for (i, cpu) in [10.0, 55.0, 90.0].into_iter().enumerate() {
            history = history.record(&fixtures::snapshot(cpu), &format!("t{i}"));
        }
        assert_eq!(values(&history.cpu), vec![55.0, 90.0]);
        let labels: Vec<_> = history.cpu.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["t1", "t2"]);
        assert_eq!(history.ram.len(), 2);
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(History::default().capacity(), DEFAULT_HISTORY_CAPACITY);
    }
}
