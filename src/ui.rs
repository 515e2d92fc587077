use iced::futures::SinkExt;
use iced::widget::canvas::Canvas;
use iced::widget::{
    button, column, container, progress_bar, row, scrollable, text, text_input, Column, Space,
};
use iced::{keyboard, Task};
use iced::{Alignment, Background, Border, Color, Element, Font, Length, Shadow, Subscription, Theme, Vector};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::bridge::{BridgeError, EventBridge, GET_SYSTEM_INFO, METRICS_EVENT};
use crate::chart::{AreaChart, ChartColors};
use crate::format::{clock_date, clock_time, history_label, percent_of};
use crate::gauge::{CircularGauge, GaugeColors, Sparkline};
use crate::history::{values, MetricHistory};
use crate::models::{MetricsSnapshot, SystemIdentity};
use crate::monitor::MonitorHandle;
use crate::panels::{self, CpuStatus, CpuThresholds, PanelError, RowLoad, Stat, WAITING_MESSAGE};
use crate::preferences::Preferences;
use crate::process_view::{ProcessViewCache, SortDirection, SortField};
use crate::state::{AppState, Intent, Resource, Tab};
use crate::theme::{with_alpha, Palette};

const MONO: Font = Font::MONOSPACE;
const ANIM_TICK_MS: u64 = 33; // ~30fps for gauge tweening
const TWEEN_SPEED: f32 = 0.12; // lerp factor per animation tick
const CONVERGED: f32 = 0.1;

// ─── MESSAGE ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Message {
    /// Raw `metrics-update` payload, decoded in `update`.
    MetricsReceived(String),
    IdentityLoaded(Result<SystemIdentity, BridgeError>),
    ThemeToggled,
    TabSelected(Tab),
    ResourceSelected(Resource),
    SortBy(SortField),
    SearchChanged(String),
    SearchCleared,
    ClockTick,
    AnimTick,
    KeyPressed(keyboard::Key, keyboard::Modifiers),
}

// ─── APP STATE ─────────────────────────────────────────────────

pub struct Nexmon {
    bridge: EventBridge,
    prefs: Preferences,
    thresholds: CpuThresholds,
    state: AppState,
    processes: ProcessViewCache,
    now: DateTime<Local>,
    /// Gauge values, eased toward the latest snapshot.
    anim_cpu: f32,
    anim_mem_pct: f32,
    /// Stops and joins the sampler thread when the window goes away.
    _monitor: Option<MonitorHandle>,
}

impl Nexmon {
    pub fn new(
        bridge: EventBridge,
        prefs: Preferences,
        monitor: Option<MonitorHandle>,
    ) -> (Self, Task<Message>) {
        let identity = {
            let bridge = bridge.clone();
            Task::perform(
                async move { bridge.invoke::<SystemIdentity>(GET_SYSTEM_INFO) },
                Message::IdentityLoaded,
            )
        };
        let app = Self {
            bridge,
            thresholds: CpuThresholds::from(&prefs),
            state: AppState::with_capacity(prefs.history_capacity),
            prefs,
            processes: ProcessViewCache::default(),
            now: Local::now(),
            anim_cpu: 0.0,
            anim_mem_pct: 0.0,
            _monitor: monitor,
        };
        (app, identity)
    }

    pub fn title(&self) -> String {
        String::from("Nexmon")
    }

    pub fn theme(&self) -> Theme {
        self.state.view.theme.iced_theme()
    }

    fn pal(&self) -> Palette {
        self.state.view.theme.palette()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let metrics = Subscription::run_with_id(METRICS_EVENT, metrics_stream(self.bridge.clone()));
        let clock = iced::time::every(Duration::from_secs(1)).map(|_| Message::ClockTick);
        let anim = if self.animating() {
            iced::time::every(Duration::from_millis(ANIM_TICK_MS)).map(|_| Message::AnimTick)
        } else {
            Subscription::none()
        };
        let keys = keyboard::on_key_press(|key, modifiers| Some(Message::KeyPressed(key, modifiers)));
        Subscription::batch([metrics, clock, anim, keys])
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::MetricsReceived(payload) => match MetricsSnapshot::from_payload(&payload) {
                Ok(snapshot) => {
                    let label = history_label(&Local::now());
                    tracing::trace!(%label, cpu = snapshot.cpu_usage, "snapshot accepted");
                    self.apply(Intent::MetricsArrived { snapshot, label });
                }
                Err(e) => tracing::warn!(error = %e, "skipping metrics payload"),
            },
            Message::IdentityLoaded(result) => self.apply(Intent::IdentityResolved(result)),
            Message::ThemeToggled => self.apply(Intent::ThemeToggled),
            Message::TabSelected(tab) => self.apply(Intent::TabSelected(tab)),
            Message::ResourceSelected(resource) => self.apply(Intent::ResourceSelected(resource)),
            Message::SortBy(field) => self.apply(Intent::SortRequested(field)),
            Message::SearchChanged(query) => self.apply(Intent::SearchChanged(query)),
            Message::SearchCleared => self.apply(Intent::SearchCleared),
            Message::ClockTick => self.now = Local::now(),
            Message::AnimTick => {
                let (cpu, mem) = self.targets();
                self.anim_cpu = tween(self.anim_cpu, cpu);
                self.anim_mem_pct = tween(self.anim_mem_pct, mem);
            }
            Message::KeyPressed(key, modifiers) => self.on_key(key, modifiers),
        }
    }

    fn apply(&mut self, intent: Intent) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(intent);
        if let Some(snap) = &self.state.metrics {
            self.processes.refresh(
                self.state.generation,
                &snap.all_processes,
                &self.state.view.search,
                self.state.view.sort,
            );
        }
    }

    fn on_key(&mut self, key: keyboard::Key, modifiers: keyboard::Modifiers) {
        use keyboard::key::Named;
        let current = self.state.view.tab;
        match key {
            keyboard::Key::Character(ref c) => match c.as_str() {
                "1" => self.apply(Intent::TabSelected(Tab::Dashboard)),
                "2" => self.apply(Intent::TabSelected(Tab::Resources)),
                "3" => self.apply(Intent::TabSelected(Tab::Processes)),
                "t" => self.apply(Intent::ThemeToggled),
                _ => {}
            },
            keyboard::Key::Named(Named::Escape) if current == Tab::Processes => {
                self.apply(Intent::SearchCleared)
            }
            keyboard::Key::Named(Named::Tab) => {
                let idx = Tab::ALL.iter().position(|&t| t == current).unwrap_or(0);
                let n = Tab::ALL.len();
                let next = if modifiers.shift() { (idx + n - 1) % n } else { (idx + 1) % n };
                self.apply(Intent::TabSelected(Tab::ALL[next]));
            }
            _ => {}
        }
    }

    /// Gauge targets: cpu and memory percentages of the current snapshot.
    fn targets(&self) -> (f32, f32) {
        self.state
            .metrics
            .as_ref()
            .map(|s| (s.cpu_usage, percent_of(s.ram_used, s.ram_total).min(100.0)))
            .unwrap_or((0.0, 0.0))
    }

    fn animating(&self) -> bool {
        let (cpu, mem) = self.targets();
        (cpu - self.anim_cpu).abs() > CONVERGED || (mem - self.anim_mem_pct).abs() > CONVERGED
    }

    fn chart_colors(&self) -> ChartColors {
        let p = self.pal();
        ChartColors {
            bg: p.surface,
            border: p.border_subtle,
            grid: p.grid,
            label: p.text_muted,
            text: p.text_main,
        }
    }

    fn gauge_colors(&self) -> GaugeColors {
        let p = self.pal();
        GaugeColors {
            track: p.border_subtle,
            text: p.text_main,
            muted: p.text_muted,
        }
    }

    // ─── MAIN VIEW ──────────────────────────────────────────────

    pub fn view(&self) -> Element<'_, Message> {
        let p = self.pal();

        let content: Element<Message> = match self.state.view.tab {
            Tab::Dashboard => self.view_dashboard(),
            Tab::Resources => self.view_resources(),
            Tab::Processes => self.view_processes(),
        };

        let bg = p.bg_main;
        let main = column![
            bar(self.view_header(), &p),
            container(content).height(Length::Fill),
            bar(self.view_footer(), &p),
        ]
        .spacing(0);

        container(main)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(move |_: &Theme| container::Style {
                background: Some(Background::Color(bg)),
                ..Default::default()
            })
            .into()
    }

    fn view_header(&self) -> Element<'_, Message> {
        let p = self.pal();
        let tabs = Tab::ALL
            .iter()
            .fold(row![].spacing(4), |r, &tab| r.push(menu_tab(tab, self.state.view.tab, &p)));

        let toggle_label = if self.state.view.theme.is_dark() { "☀ Light" } else { "☾ Dark" };
        let theme_btn = button(text(toggle_label).size(12).color(p.text_secondary))
            .on_press(Message::ThemeToggled)
            .style(button::text)
            .padding([4, 10]);

        row![
            text("Nexmon").size(16).color(p.primary),
            Space::with_width(Length::Fill),
            tabs,
            Space::with_width(Length::Fill),
            theme_btn,
        ]
        .align_y(Alignment::Center)
        .padding([6, 12])
        .into()
    }

    fn view_footer(&self) -> Element<'_, Message> {
        let p = self.pal();
        let (dot, status) = match self.state.history.cpu.last() {
            Some(point) => (
                p.success,
                format!(
                    "Live • updated {} • every {}s",
                    point.label, self.prefs.refresh_interval_secs
                ),
            ),
            None => (p.warning, WAITING_MESSAGE.to_string()),
        };
        row![
            text("●").size(10).color(dot),
            text(status).size(11).color(p.text_muted),
            Space::with_width(Length::Fill),
            text(format!("v{}", env!("CARGO_PKG_VERSION"))).size(11).font(MONO).color(p.text_muted),
        ]
        .spacing(6)
        .align_y(Alignment::Center)
        .padding([4, 12])
        .into()
    }

    // ─── DASHBOARD TAB ─────────────────────────────────────────

    fn view_dashboard(&self) -> Element<'_, Message> {
        let p = self.pal();
        let welcome = panels::welcome(&self.state.identity);

        let welcome_card = card(
            row![
                column![
                    text(welcome.greeting).size(22).color(p.text_main),
                    text(welcome.host_line).size(12).color(p.text_secondary),
                ]
                .spacing(4),
                Space::with_width(Length::Fill),
                column![
                    text(clock_time(&self.now)).size(26).font(MONO).color(p.primary),
                    text(clock_date(&self.now)).size(12).color(p.text_secondary),
                ]
                .spacing(2)
                .align_x(Alignment::End),
            ]
            .align_y(Alignment::Center)
            .into(),
            &p,
        );

        let Some(snap) = self.state.metrics.as_deref() else {
            return column![welcome_card, waiting(&p)].spacing(12).padding(16).into();
        };

        let cards = row![
            self.cpu_card(snap),
            self.memory_card(snap),
            self.network_card(snap),
        ]
        .spacing(12);

        scrollable(column![welcome_card, cards].spacing(12).padding(16)).into()
    }

    fn cpu_card(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let model = panels::cpu_card(snap, self.thresholds);
        let color = status_color(model.status, &p);
        let gauge = Canvas::new(CircularGauge {
            value: self.anim_cpu,
            color,
            colors: self.gauge_colors(),
        })
        .width(Length::Fixed(120.0))
        .height(Length::Fixed(120.0));

        card(
            column![
                card_title("CPU", &p),
                gauge,
                row![text("●").size(10).color(color), text(model.status.label()).size(12).color(color)]
                    .spacing(4)
                    .align_y(Alignment::Center),
            ]
            .spacing(10)
            .align_x(Alignment::Center)
            .into(),
            &p,
        )
    }

    fn memory_card(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let model = match panels::memory_card(snap) {
            Ok(m) => m,
            Err(e) => return fault_card("Memory", &e, &p),
        };
        let gauge = Canvas::new(CircularGauge {
            value: self.anim_mem_pct,
            color: p.secondary,
            colors: self.gauge_colors(),
        })
        .width(Length::Fixed(120.0))
        .height(Length::Fixed(120.0));

        card(
            column![
                card_title("Memory", &p),
                gauge,
                text(model.used_total).size(12).font(MONO).color(p.text_secondary),
            ]
            .spacing(10)
            .align_x(Alignment::Center)
            .into(),
            &p,
        )
    }

    fn network_card(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let model = panels::network_card(snap);
        let speed = |arrow: &str, label: &str, value: String, color: Color| -> Element<'static, Message> {
            column![
                text(format!("{arrow} {label}")).size(11).color(p.text_muted),
                text(value).size(20).font(MONO).color(color),
            ]
            .spacing(2)
            .into()
        };

        card(
            column![
                card_title("Network", &p),
                Space::with_height(12),
                speed("↓", "Download", model.download, p.success),
                speed("↑", "Upload", model.upload, p.primary),
            ]
            .spacing(10)
            .into(),
            &p,
        )
    }

    // ─── RESOURCES TAB ─────────────────────────────────────────

    fn view_resources(&self) -> Element<'_, Message> {
        let p = self.pal();
        let Some(snap) = self.state.metrics.as_deref() else {
            return container(waiting(&p)).padding(16).into();
        };

        let current = self.state.view.resource;
        let sidebar = panels::sidebar(snap).into_iter().fold(
            Column::new().spacing(4).width(Length::Fixed(230.0)),
            |col, entry| {
                let history = match entry.resource {
                    Resource::Cpu => Some((&self.state.history.cpu, p.primary)),
                    Resource::Memory => Some((&self.state.history.ram, p.secondary)),
                    _ => None,
                };
                col.push(sidebar_item(entry, history, current, &p))
            },
        );

        let detail = match current {
            Resource::Cpu => self.cpu_detail(snap),
            Resource::Memory => self.memory_detail(snap),
            Resource::Disk => self.disk_detail(snap),
            Resource::Network => self.network_detail(snap),
            Resource::Gpu => self.gpu_detail(snap),
        };

        row![
            container(scrollable(sidebar)).padding([12, 8]),
            scrollable(container(detail).padding(16)).width(Length::Fill),
        ]
        .height(Length::Fill)
        .into()
    }

    fn cpu_detail(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let model = panels::cpu_detail(snap);
        let name = if model.name.is_empty() { "Processor".to_string() } else { model.name };

        column![
            detail_title("CPU", name, model.usage_label, &p),
            self.history_chart(&self.state.history.cpu, "Utilization", "%", p.primary),
            row![
                stat_group("Performance", &model.performance, &p),
                stat_group("System", &model.system, &p),
            ]
            .spacing(12),
        ]
        .spacing(12)
        .into()
    }

    fn memory_detail(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let model = match panels::memory_detail(snap) {
            Ok(m) => m,
            Err(e) => return fault_card("Memory", &e, &p),
        };

        column![
            detail_title("Memory", model.total_label, format!("{:.0}%", model.percent), &p),
            self.history_chart(&self.state.history.ram, "Memory in use", " GB", p.secondary),
            card(
                column![
                    card_title("Composition", &p),
                    themed_bar(model.percent, p.secondary, p.border_subtle),
                ]
                .spacing(8)
                .into(),
                &p,
            ),
            stat_group("Details", &model.stats, &p),
        ]
        .spacing(12)
        .into()
    }

    fn disk_detail(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let model = match panels::disk_detail(snap) {
            Ok(m) => m,
            Err(e) => return fault_card("Disk", &e, &p),
        };

        let disks: Element<Message> = if model.disks.is_empty() {
            text("No disks").size(12).color(p.text_muted).into()
        } else {
            model
                .disks
                .into_iter()
                .fold(Column::new().spacing(10), |col, d| {
                    let color = usage_color(d.usage, &p);
                    col.push(
                        column![
                            row![
                                text(d.name).size(12).color(p.text_main),
                                text(d.kind).size(11).color(p.text_muted),
                                Space::with_width(Length::Fill),
                                text(format!("{:.0}%", d.usage)).size(12).font(MONO).color(color),
                            ]
                            .spacing(8),
                            themed_bar(d.usage, color, p.border_subtle),
                        ]
                        .spacing(4),
                    )
                })
                .into()
        };

        let io: [Stat; 2] = [("Read", model.read), ("Write", model.write)];
        column![
            text("Disk").size(20).color(p.text_main),
            card(column![card_title("Volumes", &p), disks].spacing(8).into(), &p),
            stat_group("Activity", &io, &p),
        ]
        .spacing(12)
        .into()
    }

    fn network_detail(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let model = panels::network_detail(snap);

        let interfaces: Element<Message> = if model.interfaces.is_empty() {
            text("No interfaces").size(12).color(p.text_muted).into()
        } else {
            model
                .interfaces
                .into_iter()
                .fold(Column::new().spacing(4), |col, (name, speed)| {
                    col.push(info_row(name, speed, &p))
                })
                .into()
        };

        column![
            text("Network").size(20).color(p.text_main),
            row![
                card(
                    column![
                        card_title("↓ Download", &p),
                        text(model.download).size(20).font(MONO).color(p.success),
                    ]
                    .spacing(6)
                    .into(),
                    &p,
                ),
                card(
                    column![
                        card_title("↑ Upload", &p),
                        text(model.upload).size(20).font(MONO).color(p.primary),
                    ]
                    .spacing(6)
                    .into(),
                    &p,
                ),
            ]
            .spacing(12),
            card(column![card_title("Interfaces", &p), interfaces].spacing(8).into(), &p),
        ]
        .spacing(12)
        .into()
    }

    fn gpu_detail(&self, snap: &MetricsSnapshot) -> Element<'_, Message> {
        let p = self.pal();
        let rows = match panels::gpu_detail(snap) {
            Ok(rows) => rows,
            Err(e) => return fault_card("GPU", &e, &p),
        };
        if rows.is_empty() {
            return column![
                text("GPU").size(20).color(p.text_main),
                card(text("No GPU detected").size(12).color(p.text_muted).into(), &p),
            ]
            .spacing(12)
            .into();
        }

        rows.into_iter()
            .fold(
                Column::new().spacing(12).push(text("GPU").size(20).color(p.text_main)),
                |col, g| {
                    let color = usage_color(g.usage, &p);
                    let mut body = column![
                        row![
                            text(g.name).size(13).color(p.text_main),
                            Space::with_width(Length::Fill),
                            text(format!("{:.0}%", g.usage)).size(13).font(MONO).color(color),
                        ],
                        themed_bar(g.usage, color, p.border_subtle),
                    ]
                    .spacing(6);
                    if let Some(memory) = g.memory {
                        body = body.push(info_row("Memory", memory, &p));
                    }
                    col.push(card(body.into(), &p))
                },
            )
            .into()
    }

    fn history_chart(
        &self,
        series: &MetricHistory,
        title: &str,
        unit: &'static str,
        color: Color,
    ) -> Element<'static, Message> {
        Canvas::new(AreaChart {
            points: series.iter().cloned().collect(),
            title: format!("{title} · last {} samples", self.state.history.capacity()),
            unit,
            color,
            colors: self.chart_colors(),
        })
        .width(Length::Fill)
        .height(Length::Fixed(200.0))
        .into()
    }

    // ─── PROCESSES TAB ─────────────────────────────────────────

    fn view_processes(&self) -> Element<'_, Message> {
        let p = self.pal();
        let Some(snap) = self.state.metrics.as_deref() else {
            return container(waiting(&p)).padding(16).into();
        };

        let header = panels::process_header(snap);
        let stats = row![
            header_stat("Avg CPU", header.avg_cpu, p.primary, &p),
            header_stat("Memory", header.total_memory, p.secondary, &p),
            header_stat("Processes", header.count, p.text_main, &p),
        ]
        .spacing(12);

        let search = &self.state.view.search;
        let mut search_row = row![text_input("Search processes...", search)
            .on_input(Message::SearchChanged)
            .size(12)
            .padding([6, 10])
            .width(Length::Fill)]
        .spacing(6)
        .align_y(Alignment::Center);
        if !search.is_empty() {
            search_row = search_row.push(
                button(text("✕").size(12).color(p.text_secondary))
                    .on_press(Message::SearchCleared)
                    .style(button::secondary)
                    .padding([4, 10]),
            );
        }

        let sort = self.state.view.sort;
        let marker = |field: SortField| -> &'static str {
            match (sort.field == field, sort.direction) {
                (false, _) => "",
                (true, SortDirection::Ascending) => " ▲",
                (true, SortDirection::Descending) => " ▼",
            }
        };
        let columns = container(
            row![
                sort_btn(format!("Name{}", marker(SortField::Name)), SortField::Name, Length::Fill, &p),
                sort_btn(format!("PID{}", marker(SortField::Pid)), SortField::Pid, Length::Fixed(80.0), &p),
                sort_btn(format!("CPU{}", marker(SortField::Cpu)), SortField::Cpu, Length::Fixed(80.0), &p),
                sort_btn(
                    format!("Memory{}", marker(SortField::Memory)),
                    SortField::Memory,
                    Length::Fixed(100.0),
                    &p,
                ),
            ]
            .spacing(2),
        )
        .padding([4, 10]);

        let view = self.processes.rows();
        let table = panels::process_table(&view, search, self.prefs.process_row_limit);

        let body: Element<Message> = match table.empty_message {
            Some(message) => container(text(message).size(13).color(p.text_muted))
                .center_x(Length::Fill)
                .padding(24)
                .into(),
            None => {
                let stripe = with_alpha(p.surface_hover, 0.5);
                let mut rows = table.rows.into_iter().enumerate().fold(
                    Column::new().spacing(0),
                    |col, (i, r)| {
                        let bg = if i % 2 == 0 { Color::TRANSPARENT } else { stripe };
                        col.push(process_row(r, bg, &p))
                    },
                );
                if table.hidden > 0 {
                    rows = rows.push(
                        container(
                            text(format!("+{} more", table.hidden)).size(11).color(p.text_muted),
                        )
                        .padding([6, 10]),
                    );
                }
                scrollable(rows).height(Length::Fill).into()
            }
        };

        column![
            stats,
            search_row,
            card(column![columns, body].spacing(0).into(), &p),
        ]
        .spacing(12)
        .padding(16)
        .into()
    }
}

/// Feed `metrics-update` payloads into the update loop. The stream owns the
/// listener, so dropping the subscription unsubscribes.
fn metrics_stream(bridge: EventBridge) -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(64, move |mut output| async move {
        let mut listener = bridge.listen(METRICS_EVENT);
        while let Some(payload) = listener.recv().await {
            if output.send(Message::MetricsReceived(payload)).await.is_err() {
                break;
            }
        }
        tracing::debug!("metrics stream closed");
    })
}

fn tween(current: f32, target: f32) -> f32 {
    if (target - current).abs() > CONVERGED {
        current + (target - current) * TWEEN_SPEED
    } else {
        target
    }
}

fn status_color(status: CpuStatus, p: &Palette) -> Color {
    match status {
        CpuStatus::Normal => p.success,
        CpuStatus::Moderate => p.warning,
        CpuStatus::High => p.error,
    }
}

fn load_color(load: RowLoad, p: &Palette) -> Color {
    match load {
        RowLoad::Idle => p.text_main,
        RowLoad::Busy => p.warning,
        RowLoad::Hot => p.error,
    }
}

fn usage_color(usage: f32, p: &Palette) -> Color {
    if usage > 90.0 {
        p.error
    } else if usage > 75.0 {
        p.warning
    } else {
        p.primary
    }
}

// ─── WIDGET HELPERS ────────────────────────────────────────────

fn bar<'a>(content: Element<'a, Message>, p: &Palette) -> Element<'a, Message> {
    let bg = p.bg_secondary;
    let border_c = p.border_subtle;
    container(content)
        .width(Length::Fill)
        .style(move |_: &Theme| container::Style {
            background: Some(Background::Color(bg)),
            border: Border { color: border_c, width: 1.0, radius: 0.0.into() },
            ..Default::default()
        })
        .into()
}

fn card<'a>(content: Element<'a, Message>, p: &Palette) -> Element<'a, Message> {
    let surface = p.surface;
    let border_c = p.border_subtle;
    container(content)
        .width(Length::Fill)
        .padding(14)
        .style(move |_: &Theme| container::Style {
            background: Some(Background::Color(surface)),
            border: Border {
                color: border_c,
                width: 1.0,
                radius: 10.0.into(),
            },
            shadow: Shadow {
                color: Color::from_rgba(0.0, 0.0, 0.0, 0.12),
                offset: Vector::new(0.0, 2.0),
                blur_radius: 8.0,
            },
            ..Default::default()
        })
        .into()
}

/// Stands in for a panel whose data failed its consistency checks.
fn fault_card(title: &str, err: &PanelError, p: &Palette) -> Element<'static, Message> {
    tracing::debug!(panel = title, error = %err, "panel fault");
    card(
        column![
            text(format!("⚠ {title} unavailable")).size(13).color(p.error),
            text(err.to_string()).size(11).color(p.text_muted),
        ]
        .spacing(4)
        .into(),
        p,
    )
}

fn waiting(p: &Palette) -> Element<'static, Message> {
    card(
        container(text(WAITING_MESSAGE).size(14).color(p.text_muted))
            .center_x(Length::Fill)
            .padding(24)
            .into(),
        p,
    )
}

fn card_title(label: &str, p: &Palette) -> Element<'static, Message> {
    text(label.to_uppercase()).size(11).color(p.text_muted).into()
}

fn detail_title(
    kind: &str,
    name: String,
    value: String,
    p: &Palette,
) -> Element<'static, Message> {
    row![
        column![
            text(kind.to_string()).size(20).color(p.text_main),
            text(name).size(12).color(p.text_secondary),
        ]
        .spacing(2),
        Space::with_width(Length::Fill),
        text(value).size(24).font(MONO).color(p.primary),
    ]
    .align_y(Alignment::Center)
    .into()
}

fn stat_group(title: &str, stats: &[Stat], p: &Palette) -> Element<'static, Message> {
    let rows = stats
        .iter()
        .fold(Column::new().spacing(4), |col, (label, value)| {
            col.push(info_row(*label, value, p))
        });
    card(column![card_title(title, p), rows].spacing(8).into(), p)
}

fn info_row(label: impl ToString, value: impl ToString, p: &Palette) -> Element<'static, Message> {
    row![
        text(label.to_string()).size(12).color(p.text_secondary).width(Length::Fixed(120.0)),
        Space::with_width(Length::Fill),
        text(value.to_string()).size(12).font(MONO).color(p.text_main),
    ]
    .spacing(8)
    .into()
}

fn header_stat(label: &str, value: String, color: Color, p: &Palette) -> Element<'static, Message> {
    card(
        column![
            text(label.to_string()).size(11).color(p.text_muted),
            text(value).size(20).font(MONO).color(color),
        ]
        .spacing(2)
        .into(),
        p,
    )
}

fn themed_bar(value: f32, color: Color, bar_bg: Color) -> Element<'static, Message> {
    progress_bar(0.0..=100.0, value)
        .height(Length::Fixed(8.0))
        .style(move |_: &Theme| progress_bar::Style {
            background: Background::Color(bar_bg),
            bar: Background::Color(color),
            border: Border { color: Color::TRANSPARENT, width: 0.0, radius: 4.0.into() },
        })
        .into()
}

fn menu_tab(tab: Tab, current: Tab, p: &Palette) -> Element<'static, Message> {
    let is_active = tab == current;
    let accent = p.primary;
    let text_c = p.text_main;
    let color = if is_active { accent } else { p.text_secondary };
    button(text(tab.label()).size(12).color(color))
        .on_press(Message::TabSelected(tab))
        .padding([4, 14])
        .style(move |_: &Theme, status| {
            let bg = match status {
                button::Status::Hovered => with_alpha(accent, 0.15),
                button::Status::Pressed => with_alpha(accent, 0.25),
                _ if is_active => with_alpha(accent, 0.1),
                _ => Color::TRANSPARENT,
            };
            button::Style {
                background: Some(Background::Color(bg)),
                text_color: text_c,
                border: Border { color: Color::TRANSPARENT, width: 0.0, radius: 6.0.into() },
                ..Default::default()
            }
        })
        .into()
}

fn sidebar_item(
    entry: panels::SidebarEntry,
    history: Option<(&MetricHistory, Color)>,
    current: Resource,
    p: &Palette,
) -> Element<'static, Message> {
    let is_active = entry.resource == current;
    let accent = p.primary;
    let surface = p.surface;
    let hover_bg = p.surface_hover;
    let text_c = p.text_main;

    let mut content = column![
        row![
            text(entry.label).size(13).color(if is_active { accent } else { text_c }),
            Space::with_width(Length::Fill),
            text(entry.value).size(13).font(MONO).color(text_c),
        ],
        text(entry.sublabel).size(11).color(p.text_muted),
    ]
    .spacing(2);

    if let Some((series, color)) = history {
        content = content.push(
            Canvas::new(Sparkline { data: values(series), color })
                .width(Length::Fill)
                .height(Length::Fixed(22.0)),
        );
    }

    button(content)
        .on_press(Message::ResourceSelected(entry.resource))
        .width(Length::Fill)
        .padding([8, 10])
        .style(move |_: &Theme, status| {
            let bg = match status {
                button::Status::Hovered | button::Status::Pressed => hover_bg,
                _ if is_active => hover_bg,
                _ => surface,
            };
            button::Style {
                background: Some(Background::Color(bg)),
                text_color: text_c,
                border: Border {
                    color: if is_active { accent } else { Color::TRANSPARENT },
                    width: if is_active { 1.5 } else { 0.0 },
                    radius: 8.0.into(),
                },
                shadow: Shadow::default(),
            }
        })
        .into()
}

fn sort_btn(label: String, field: SortField, width: Length, p: &Palette) -> Element<'static, Message> {
    button(text(label).size(11).color(p.text_secondary))
        .on_press(Message::SortBy(field))
        .style(button::text)
        .padding([2, 4])
        .width(width)
        .into()
}

fn process_row(r: panels::ProcessRow, bg: Color, p: &Palette) -> Element<'static, Message> {
    let accent = p.primary;
    let load = load_color(r.load, p);
    let dot = match r.load {
        RowLoad::Idle => p.success,
        _ => load,
    };

    let badge = container(text(r.initial.to_string()).size(11).color(accent))
        .center_x(Length::Fixed(22.0))
        .center_y(Length::Fixed(22.0))
        .style(move |_: &Theme| container::Style {
            background: Some(Background::Color(with_alpha(accent, 0.15))),
            border: Border { color: Color::TRANSPARENT, width: 0.0, radius: 6.0.into() },
            ..Default::default()
        });

    container(
        row![
            row![badge, text("●").size(8).color(dot), text(r.name).size(12).color(p.text_main)]
                .spacing(6)
                .align_y(Alignment::Center)
                .width(Length::Fill),
            text(r.pid.to_string()).size(12).font(MONO).color(p.text_muted).width(Length::Fixed(80.0)),
            text(r.cpu).size(12).font(MONO).color(load).width(Length::Fixed(80.0)),
            text(r.memory).size(12).font(MONO).color(p.text_secondary).width(Length::Fixed(100.0)),
        ]
        .spacing(2)
        .align_y(Alignment::Center),
    )
    .padding([3, 14])
    .style(move |_: &Theme| container::Style {
        background: Some(Background::Color(bg)),
        ..Default::default()
    })
    .into()
}
