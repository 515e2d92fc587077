//! Application state and its transitions.
//!
//! `AppState` is only ever changed through [`AppState::apply`], which takes
//! the old state by value and returns the next one.

use std::sync::Arc;

use crate::bridge::BridgeError;
use crate::history::History;
use crate::models::{MetricsSnapshot, SystemIdentity};
use crate::process_view::{ProcessSort, SortField};
use crate::theme::ThemeMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Resources,
    Processes,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Dashboard, Tab::Resources, Tab::Processes];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Resources => "Resources",
            Tab::Processes => "Processes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resource {
    #[default]
    Cpu,
    Memory,
    Disk,
    Network,
    Gpu,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Cpu,
        Resource::Memory,
        Resource::Disk,
        Resource::Network,
        Resource::Gpu,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Resource::Cpu => "CPU",
            Resource::Memory => "Memory",
            Resource::Disk => "Disk",
            Resource::Network => "Network",
            Resource::Gpu => "GPU",
        }
    }
}

/// Transient UI selections, reset on restart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub theme: ThemeMode,
    pub tab: Tab,
    pub resource: Resource,
    pub sort: ProcessSort,
    pub search: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Identity {
    #[default]
    Loading,
    Known(SystemIdentity),
}

#[derive(Debug, Clone)]
pub enum Intent {
    /// A decoded and validated snapshot, with the wall-clock label of its
    /// arrival.
    MetricsArrived {
        snapshot: MetricsSnapshot,
        label: String,
    },
    ThemeToggled,
    TabSelected(Tab),
    ResourceSelected(Resource),
    SortRequested(SortField),
    SearchChanged(String),
    SearchCleared,
    IdentityResolved(Result<SystemIdentity, BridgeError>),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: ViewState,
    pub metrics: Option<Arc<MetricsSnapshot>>,
    pub history: History,
    pub identity: Identity,
    /// Bumped once per accepted snapshot; keys derived-view caches.
    pub generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_capacity(crate::history::DEFAULT_HISTORY_CAPACITY)
    }
}

impl AppState {
    pub fn with_capacity(history_capacity: usize) -> Self {
        Self {
            view: ViewState::default(),
            metrics: None,
            history: History::with_capacity(history_capacity),
            identity: Identity::Loading,
            generation: 0,
        }
    }

    pub fn apply(self, intent: Intent) -> Self {
        let Self {
            mut view,
            metrics,
            history,
            identity,
            generation,
        } = self;

        match intent {
            Intent::MetricsArrived { snapshot, label } => {
                let history = history.record(&snapshot, &label);
                return Self {
                    view,
                    metrics: Some(Arc::new(snapshot)),
                    history,
                    identity,
                    generation: generation + 1,
                };
            }
            Intent::IdentityResolved(result) => {
                let known = result.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "system info unavailable, using fallback identity");
                    SystemIdentity::fallback()
                });
                return Self {
                    view,
                    metrics,
                    history,
                    identity: Identity::Known(known),
                    generation,
                };
            }
            Intent::ThemeToggled => view.theme = view.theme.toggled(),
            Intent::TabSelected(tab) => view.tab = tab,
            Intent::ResourceSelected(resource) => view.resource = resource,
            Intent::SortRequested(field) => view.sort = view.sort.toggled(field),
            Intent::SearchChanged(text) => view.search = text,
            Intent::SearchCleared => view.search.clear(),
        }

        Self {
            view,
            metrics,
            history,
            identity,
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::values;
    use crate::models::fixtures;
    use crate::process_view::SortDirection;

    fn arrived(cpu: f32, label: &str) -> Intent {
        Intent::MetricsArrived {
            snapshot: fixtures::snapshot(cpu),
            label: label.into(),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = AppState::default();
        assert_eq!(state.view.theme, ThemeMode::Dark);
        assert_eq!(state.view.tab, Tab::Dashboard);
        assert_eq!(state.view.resource, Resource::Cpu);
        assert_eq!(state.view.sort, ProcessSort::default());
        assert!(state.metrics.is_none());
        assert!(state.history.cpu.is_empty());
        assert_eq!(state.identity, Identity::Loading);
    }

    #[test]
    fn test_three_ticks_with_capacity_two() {
        let state = [10.0, 55.0, 90.0]
            .into_iter()
            .enumerate()
            .fold(AppState::with_capacity(2), |s, (i, cpu)| {
                s.apply(arrived(cpu, &format!("t{i}")))
            });
        assert_eq!(values(&state.history.cpu), vec![55.0, 90.0]);
        assert_eq!(state.history.ram.len(), 2);
        assert_eq!(state.generation, 3);
        assert_eq!(state.metrics.as_ref().map(|m| m.cpu_usage), Some(90.0));
    }

    #[test]
    fn test_identity_failure_uses_fallback() {
        let state = AppState::default().apply(Intent::IdentityResolved(Err(
            BridgeError::UnknownCommand("get_system_info".into()),
        )));
        assert_eq!(state.identity, Identity::Known(SystemIdentity::fallback()));
    }

    #[test]
    fn test_identity_success() {
        let id = SystemIdentity {
            username: "ada".into(),
            hostname: "engine".into(),
            os: "linux".into(),
        };
        let state = AppState::default().apply(Intent::IdentityResolved(Ok(id.clone())));
        assert_eq!(state.identity, Identity::Known(id));
    }

    #[test]
    fn test_view_transitions_leave_data_alone() {
        let state = AppState::default().apply(arrived(20.0, "a"));
        let state = state
            .apply(Intent::ThemeToggled)
            .apply(Intent::TabSelected(Tab::Processes))
            .apply(Intent::ResourceSelected(Resource::Gpu))
            .apply(Intent::SearchChanged("fire".into()));
        assert_eq!(state.view.theme, ThemeMode::Light);
        assert_eq!(state.view.tab, Tab::Processes);
        assert_eq!(state.view.resource, Resource::Gpu);
        assert_eq!(state.view.search, "fire");
        assert_eq!(state.generation, 1);
        assert_eq!(state.history.cpu.len(), 1);

        let state = state.apply(Intent::ThemeToggled).apply(Intent::SearchCleared);
        assert_eq!(state.view.theme, ThemeMode::Dark);
        assert!(state.view.search.is_empty());
    }

    #[test]
    fn test_sort_requests_toggle() {
        let state = AppState::default().apply(Intent::SortRequested(SortField::Cpu));
        assert_eq!(state.view.sort.direction, SortDirection::Ascending);
        let state = state.apply(Intent::SortRequested(SortField::Memory));
        assert_eq!(state.view.sort.field, SortField::Memory);
        assert_eq!(state.view.sort.direction, SortDirection::Descending);
    }
}
