//! Client-side filtering and sorting of the process table.

use std::cmp::Ordering;
use std::sync::Arc;

use feruca::Collator;

use crate::models::ProcessRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Pid,
    Cpu,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for ProcessSort {
    fn default() -> Self {
        Self {
            field: SortField::Cpu,
            direction: SortDirection::Descending,
        }
    }
}

impl ProcessSort {
    /// Clicking the active column flips its direction; clicking another
    /// column selects it, descending.
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Descending,
            }
        }
    }
}

/// Names compare by Unicode collation in CLDR root order; punctuation only
/// counts once everything else ties.
fn compare(collator: &mut Collator, a: &ProcessRecord, b: &ProcessRecord, field: SortField) -> Ordering {
    match field {
        SortField::Name => collator.collate(a.name.as_str(), b.name.as_str()),
        SortField::Pid => a.pid.cmp(&b.pid),
        SortField::Cpu => a.cpu.total_cmp(&b.cpu),
        SortField::Memory => a.memory.cmp(&b.memory),
    }
}

fn matches(process: &ProcessRecord, query: &str) -> bool {
    process.name.to_lowercase().contains(query) || process.pid.to_string().contains(query)
}

/// Filter by `query` and order by `sort`. The input is left untouched and
/// ties keep their input order in either direction.
pub fn derive_view(processes: &[ProcessRecord], query: &str, sort: ProcessSort) -> Vec<ProcessRecord> {
    let mut view: Vec<ProcessRecord> = if query.trim().is_empty() {
        processes.to_vec()
    } else {
        let query = query.to_lowercase();
        processes.iter().filter(|p| matches(p, &query)).cloned().collect()
    };

    let mut collator = Collator::default();
    view.sort_by(|a, b| {
        let ord = compare(&mut collator, a, b, sort.field);
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    view
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    generation: u64,
    query: String,
    sort: ProcessSort,
}

/// Memoized [`derive_view`], keyed on the snapshot generation and the view
/// inputs. A recompute swaps in a fresh `Arc`; cached views are never edited.
#[derive(Debug, Default)]
pub struct ProcessViewCache {
    key: Option<CacheKey>,
    rows: Arc<Vec<ProcessRecord>>,
}

impl ProcessViewCache {
    /// Returns `true` when the view had to be recomputed.
    pub fn refresh(
        &mut self,
        generation: u64,
        processes: &[ProcessRecord],
        query: &str,
        sort: ProcessSort,
    ) -> bool {
        let key = CacheKey {
            generation,
            query: query.to_owned(),
            sort,
        };
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.rows = Arc::new(derive_view(processes, query, sort));
        self.key = Some(key);
        true
    }

    pub fn rows(&self) -> Arc<Vec<ProcessRecord>> {
        Arc::clone(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::process;

    fn pids(view: &[ProcessRecord]) -> Vec<u32> {
        view.iter().map(|p| p.pid).collect()
    }

    fn sample() -> Vec<ProcessRecord> {
        vec![
            process(10, "bash", 1.0, 300),
            process(20, "Firefox", 40.0, 900),
            process(30, "cargo", 15.0, 600),
            process(40, "bash", 2.0, 100),
        ]
    }

    fn sort(field: SortField, direction: SortDirection) -> ProcessSort {
        ProcessSort { field, direction }
    }

    #[test]
    fn test_memory_desc_scenario() {
        let procs = vec![process(1, "a", 5.0, 100), process(2, "b", 50.0, 50)];
        let view = derive_view(&procs, "", sort(SortField::Memory, SortDirection::Descending));
        assert_eq!(pids(&view), vec![1, 2]);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let view = derive_view(&sample(), "FIRE", ProcessSort::default());
        assert_eq!(pids(&view), vec![20]);
        let view = derive_view(&sample(), "fox", ProcessSort::default());
        assert_eq!(pids(&view), vec![20]);
    }

    #[test]
    fn test_filter_matches_pid_substring() {
        let view = derive_view(&sample(), "3", ProcessSort::default());
        assert_eq!(pids(&view), vec![30]);
    }

    #[test]
    fn test_blank_query_is_unfiltered() {
        let view = derive_view(&sample(), "   ", sort(SortField::Pid, SortDirection::Ascending));
        assert_eq!(pids(&view), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_no_match_yields_empty_view() {
        assert!(derive_view(&sample(), "zzz", ProcessSort::default()).is_empty());
    }

    #[test]
    fn test_cpu_toggle_reverses_order() {
        let desc = ProcessSort::default();
        assert_eq!(desc, sort(SortField::Cpu, SortDirection::Descending));
        assert_eq!(pids(&derive_view(&sample(), "", desc)), vec![20, 30, 40, 10]);

        let asc = desc.toggled(SortField::Cpu);
        assert_eq!(asc.direction, SortDirection::Ascending);
        assert_eq!(pids(&derive_view(&sample(), "", asc)), vec![10, 40, 30, 20]);
    }

    #[test]
    fn test_new_field_resets_to_descending() {
        let asc = ProcessSort::default().toggled(SortField::Cpu);
        let by_name = asc.toggled(SortField::Name);
        assert_eq!(by_name, sort(SortField::Name, SortDirection::Descending));
    }

    #[test]
    fn test_name_sort_is_case_insensitive_and_stable() {
        let asc = derive_view(&sample(), "", sort(SortField::Name, SortDirection::Ascending));
        // duplicate "bash" rows keep input order (10 before 40)
        assert_eq!(pids(&asc), vec![10, 40, 30, 20]);

        let desc = derive_view(&sample(), "", sort(SortField::Name, SortDirection::Descending));
        assert_eq!(pids(&desc), vec![20, 30, 10, 40]);
    }

    #[test]
    fn test_lowercase_sorts_before_uppercase_on_tie() {
        let procs = vec![process(1, "Zed", 0.0, 0), process(2, "zed", 0.0, 0)];
        let view = derive_view(&procs, "", sort(SortField::Name, SortDirection::Ascending));
        assert_eq!(pids(&view), vec![2, 1]);
    }

    #[test]
    fn test_name_sort_collates_accents_and_punctuation() {
        let procs = vec![
            process(1, "zsh", 0.0, 0),
            process(2, "émile", 0.0, 0),
            process(3, "a_b", 0.0, 0),
            process(4, "a-b", 0.0, 0),
            process(5, "Ärger", 0.0, 0),
        ];
        let view = derive_view(&procs, "", sort(SortField::Name, SortDirection::Ascending));
        let names: Vec<_> = view.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a_b", "a-b", "Ärger", "émile", "zsh"]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let procs = sample();
        let before = procs.clone();
        let _ = derive_view(&procs, "a", sort(SortField::Memory, SortDirection::Ascending));
        assert_eq!(procs, before);
    }

    #[test]
    fn test_cache_recomputes_only_on_key_change() {
        let procs = sample();
        let mut cache = ProcessViewCache::default();
        assert!(cache.refresh(1, &procs, "", ProcessSort::default()));
        let first = cache.rows();
        assert!(!cache.refresh(1, &procs, "", ProcessSort::default()));
        assert!(Arc::ptr_eq(&first, &cache.rows()));

        assert!(cache.refresh(1, &procs, "bash", ProcessSort::default()));
        assert_eq!(pids(&cache.rows()), vec![40, 10]);
        // previously handed-out view is unchanged
        assert_eq!(first.len(), 4);

        assert!(cache.refresh(2, &procs, "bash", ProcessSort::default()));
    }
}
