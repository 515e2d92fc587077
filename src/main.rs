#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod bridge;
mod chart;
mod format;
mod gauge;
mod gpu;
mod history;
mod models;
mod monitor;
mod panels;
mod preferences;
mod process_view;
mod ringbuf;
mod state;
mod theme;
mod ui;

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use bridge::EventBridge;
use preferences::Preferences;
use ui::Nexmon;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NEXMON_LOG").unwrap_or_else(|_| EnvFilter::new("nexmon=info")),
        )
        .init();

    let prefs = Preferences::load();
    let bridge = EventBridge::new();
    monitor::register_commands(&bridge);

    // Without a sampler the window still opens and waits for a first sample.
    let sampler = match monitor::spawn(
        bridge.clone(),
        Duration::from_secs(prefs.refresh_interval_secs),
    ) {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::error!(error = %e, "cannot start sampler thread");
            None
        }
    };

    iced::application(Nexmon::title, Nexmon::update, Nexmon::view)
        .subscription(Nexmon::subscription)
        .theme(Nexmon::theme)
        .window(iced::window::Settings {
            size: (1100.0, 720.0).into(),
            min_size: Some((760.0, 520.0).into()),
            #[cfg(target_os = "linux")]
            platform_specific: iced::window::settings::PlatformSpecific {
                application_id: String::from("nexmon"),
                ..Default::default()
            },
            ..Default::default()
        })
        .run_with(move || Nexmon::new(bridge, prefs, sampler))
}
