use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;

use winpanel::cleaner::CleanupTarget;
use winpanel::config::Config;
use winpanel::device::{ChannelView, DeviceChannel, DeviceState};
use winpanel::disk_info::{self, DiskInfo};
use winpanel::pipeline::{PipelineState, Selection, Summary};
use winpanel::runtime::{self, CoreHandle};
use winpanel::scan::ScanReport;
use winpanel::session::{CoreEvent, Input, Session};
use winpanel::utils;

const MAX_LOG_LINES: usize = 500;
const DISK_REFRESH: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Cleaner,
    Network,
}

/// Mirror of the session state, rebuilt from `CoreEvent`s only.
pub struct WinPanelApp {
    core: CoreHandle,
    panel: Panel,
    pipeline: PipelineState,
    report: Option<ScanReport>,
    selection: Selection,
    progress: u8,
    last_summary: Option<Summary>,
    devices: Vec<ChannelView>,
    log: Vec<String>,
    windows_dir: PathBuf,
    disk: Option<DiskInfo>,
    disk_checked: Option<Instant>,
}

impl WinPanelApp {
    pub fn new(cc: &eframe::CreationContext<'_>, session: Session, config: &Config) -> Self {
        let ctx = cc.egui_ctx.clone();
        let core = runtime::spawn(session, move || ctx.request_repaint());

        Self {
            core,
            panel: Panel::Cleaner,
            pipeline: PipelineState::Idle,
            report: None,
            selection: Selection::default(),
            progress: 0,
            last_summary: None,
            devices: Vec::new(),
            log: vec!["Ready. Click 'Scan System' to begin.".to_string()],
            windows_dir: config.paths.windows_dir.clone(),
            disk: None,
            disk_checked: None,
        }
    }

    fn send(&mut self, input: Input) {
        if let Err(e) = self.core.send(input) {
            self.push_log(e.to_string());
        }
    }

    fn push_log(&mut self, line: String) {
        self.log.push(line);
        if self.log.len() > MAX_LOG_LINES {
            let excess = self.log.len() - MAX_LOG_LINES;
            self.log.drain(..excess);
        }
    }

    fn drain_events(&mut self) {
        for event in self.core.drain() {
            match event {
                CoreEvent::PipelineChanged(state) => {
                    if state == PipelineState::Cleaning {
                        self.progress = 0;
                    }
                    self.pipeline = state;
                }
                CoreEvent::ScanCompleted(report) => self.report = Some(report),
                CoreEvent::SelectionChanged(selection) => self.selection = selection,
                CoreEvent::CleanStarted(_) => self.last_summary = None,
                CoreEvent::Progress(progress) => self.progress = progress,
                CoreEvent::StepFinished(_) => {}
                CoreEvent::CleanFinished(summary) => {
                    self.last_summary = Some(summary);
                    self.disk_checked = None;
                }
                CoreEvent::NothingSelected => {}
                CoreEvent::Rejected(rejection) => {
                    self.push_log(format!("Request ignored: {rejection}"));
                }
                CoreEvent::DevicesChanged(views) => self.devices = views,
                CoreEvent::Toggled(_) => {}
                CoreEvent::Log(line) => self.push_log(line),
            }
        }
    }

    fn refresh_disk(&mut self) {
        let stale = self
            .disk_checked
            .is_none_or(|at| at.elapsed() >= DISK_REFRESH);
        if stale {
            self.disk = disk_info::system_disk(&self.windows_dir);
            self.disk_checked = Some(Instant::now());
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.heading(
            egui::RichText::new("WinPanel")
                .size(22.0)
                .strong()
                .color(egui::Color32::from_rgb(80, 180, 220)),
        );
        ui.add_space(12.0);
        ui.selectable_value(&mut self.panel, Panel::Cleaner, "Cleaner");
        ui.selectable_value(&mut self.panel, Panel::Network, "Network");

        if let Some(disk) = &self.disk {
            ui.add_space(16.0);
            ui.separator();
            ui.label(egui::RichText::new("System drive").strong());
            ui.label(format!("{} free", utils::format_size(disk.available)));
            ui.add(
                egui::ProgressBar::new(disk.usage_percent())
                    .text(format!("{:.0}% used", disk.usage_percent() * 100.0)),
            );
        }
    }

    fn render_cleaner(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.pipeline.scan_enabled(), egui::Button::new("Scan System"))
                .clicked()
            {
                self.send(Input::Scan);
            }

            let selectable = self.pipeline.selection_enabled();
            if ui
                .add_enabled(selectable, egui::Button::new("Select All"))
                .clicked()
            {
                self.send(Input::SelectAll);
            }
            if ui
                .add_enabled(selectable, egui::Button::new("Deselect All"))
                .clicked()
            {
                self.send(Input::DeselectAll);
            }

            let can_clean = self.pipeline.clean_enabled();
            if ui
                .add_enabled(
                    can_clean,
                    egui::Button::new(egui::RichText::new("Clean Selected").color(
                        if can_clean {
                            egui::Color32::from_rgb(220, 60, 60)
                        } else {
                            egui::Color32::GRAY
                        },
                    )),
                )
                .clicked()
            {
                self.send(Input::Clean);
            }

            if selectable {
                ui.label(
                    egui::RichText::new(format!("{} selected", self.selection.len()))
                        .color(egui::Color32::GRAY),
                );
            }

            if self.pipeline == PipelineState::Scanning {
                ui.add_space(8.0);
                ui.spinner();
                ui.label("Scanning...");
            }
        });

        if matches!(
            self.pipeline,
            PipelineState::Cleaning | PipelineState::Completed
        ) {
            ui.add_space(4.0);
            ui.add(egui::ProgressBar::new(self.progress as f32 / 100.0).show_percentage());
        }

        if let Some(summary) = &self.last_summary {
            ui.label(
                egui::RichText::new(format!(
                    "Last cleanup: {} items, {} freed",
                    summary.deleted(),
                    utils::format_size(summary.freed_bytes())
                ))
                .color(egui::Color32::from_rgb(80, 200, 80)),
            );
        }

        ui.separator();
        let selectable = self.pipeline.selection_enabled();
        let mut toggled = Vec::new();
        for target in CleanupTarget::ALL {
            ui.horizontal(|ui| {
                let mut checked = self.selection.contains(target);
                if ui
                    .add_enabled(selectable, egui::Checkbox::new(&mut checked, target.label()))
                    .changed()
                {
                    toggled.push((target, checked));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let text = match &self.report {
                        Some(report) => utils::size_label(report.get(target)),
                        None => "-".to_string(),
                    };
                    ui.label(egui::RichText::new(text).color(egui::Color32::GRAY));
                });
            });
        }
        for (target, checked) in toggled {
            self.send(Input::SetSelected(target, checked));
        }

        if let Some(report) = &self.report {
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Total space that can be freed:").strong());
                ui.label(
                    egui::RichText::new(utils::format_size(report.total_bytes()))
                        .strong()
                        .color(egui::Color32::from_rgb(80, 200, 80)),
                );
            });
        }
    }

    fn render_network(&mut self, ui: &mut egui::Ui) {
        if self.devices.is_empty() {
            ui.spinner();
            ui.label("Reading device status...");
            return;
        }

        let mut requested = None;
        egui::Grid::new("devices")
            .num_columns(3)
            .spacing([24.0, 8.0])
            .show(ui, |ui| {
                for view in &self.devices {
                    ui.label(egui::RichText::new(view.channel.label()).strong());
                    ui.label(
                        egui::RichText::new(view.state.to_string())
                            .color(state_color(view.state)),
                    );
                    let caption = if view.channel == DeviceChannel::BluetoothRadio {
                        "Open Settings"
                    } else {
                        "Toggle"
                    };
                    if ui
                        .add_enabled(view.actionable, egui::Button::new(caption))
                        .clicked()
                    {
                        requested = Some(view.channel);
                    }
                    ui.end_row();
                }
            });

        if let Some(channel) = requested {
            self.send(Input::Toggle(channel));
        }
    }

    fn render_log(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Activity").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Clear").clicked() {
                    self.log.clear();
                }
            });
        });
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.log {
                    ui.label(egui::RichText::new(line).monospace());
                }
            });
    }
}

fn state_color(state: DeviceState) -> egui::Color32 {
    match state {
        DeviceState::Enabled => egui::Color32::from_rgb(80, 200, 80),
        DeviceState::Disabled => egui::Color32::from_rgb(220, 100, 50),
        DeviceState::Transitioning => egui::Color32::from_rgb(220, 180, 50),
        DeviceState::NotFound | DeviceState::Unknown => egui::Color32::GRAY,
    }
}

impl eframe::App for WinPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.refresh_disk();

        egui::SidePanel::left("nav")
            .resizable(false)
            .default_width(150.0)
            .show(ctx, |ui| self.render_sidebar(ui));

        egui::TopBottomPanel::bottom("log")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| self.render_log(ui));

        egui::CentralPanel::default().show(ctx, |ui| match self.panel {
            Panel::Cleaner => self.render_cleaner(ui),
            Panel::Network => self.render_network(ui),
        });
    }
}
