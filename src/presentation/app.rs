use crate::domain::control::ControlState;
use crate::domain::models::{
    AppEvent, LinkCommand, LinkState, MessageSeverity, StatusMessage, StickSide,
};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::protocol::LinkOptions;
use crate::infrastructure::bluetooth::{LinkError, LinkManager};
use crate::presentation::components::Components;
use crate::presentation::stick_widget::StickWidget;
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

pub struct DroneApp {
    settings: SettingsService,

    // Control pipeline
    control: ControlState,
    left_stick: StickWidget,
    right_stick: StickWidget,

    // Link worker
    link_tx: mpsc::UnboundedSender<LinkCommand>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,

    // State
    connection_status: LinkState,
    status_message: Option<StatusMessage>,

    // UI State
    link_prefix_input: String,
    is_dark_mode: bool,

    // Logging guard
    _logging_guard: Option<crate::infrastructure::logging::LoggingGuard>,
}

impl DroneApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        crate::presentation::theme::configure_theme(&cc.egui_ctx, false);

        let settings = SettingsService::new().expect("Failed to load settings");

        let logging_guard =
            crate::infrastructure::logging::init_logger(&settings.get().log_settings)
                .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
                .ok();

        tracing::info!("Starting FPV Drone Controller");

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = mpsc::unbounded_channel();

        let mut status_message = None;
        match LinkOptions::from_settings(&settings.get().link) {
            Ok(options) => {
                spawn_link_worker(options, event_tx, link_tx.clone(), link_rx);
            }
            Err(e) => {
                // No worker: commands go nowhere until the settings are fixed.
                error!("Link settings are invalid: {e}");
                status_message = Some(StatusMessage {
                    message: format!("Link settings are invalid: {e}"),
                    severity: MessageSeverity::Error,
                });
            }
        }

        let link_prefix_input = settings.get().link.device_name_prefixes.join(", ");

        Self {
            settings,
            control: ControlState::new(),
            left_stick: StickWidget::new(),
            right_stick: StickWidget::new(),
            link_tx,
            event_rx,
            connection_status: LinkState::Disconnected,
            status_message,
            link_prefix_input,
            is_dark_mode: false,
            _logging_guard: logging_guard,
        }
    }

    fn ui_connection_panel(&mut self, ui: &mut egui::Ui) {
        Components::section_card(ui, "Link", |ui| {
            let (status_text, bg_color, text_color) = match self.connection_status {
                LinkState::Connected => (
                    "CONNECTED",
                    egui::Color32::from_rgb(0, 180, 60),
                    egui::Color32::BLACK,
                ),
                LinkState::Connecting => (
                    "CONNECTING...",
                    egui::Color32::from_rgb(255, 200, 0),
                    egui::Color32::BLACK,
                ),
                LinkState::Discovering => (
                    "DISCOVERING...",
                    egui::Color32::from_rgb(255, 200, 0),
                    egui::Color32::BLACK,
                ),
                LinkState::Disconnected => (
                    "DISCONNECTED",
                    egui::Color32::from_gray(100),
                    egui::Color32::WHITE,
                ),
            };

            Components::status_banner(ui, status_text, bg_color, text_color);
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                if self.connection_status == LinkState::Disconnected {
                    if ui.button("Connect").clicked() {
                        // The worker answers with status events.
                        let _ = self.link_tx.send(LinkCommand::Connect);
                    }
                } else if ui.button("Disconnect").clicked() {
                    let _ = self.link_tx.send(LinkCommand::Disconnect);
                }
            });

            if let Some(msg) = &self.status_message {
                let color = match msg.severity {
                    MessageSeverity::Info => egui::Color32::from_rgb(60, 110, 200),
                    MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 60),
                    MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
                    MessageSeverity::Error => egui::Color32::from_rgb(220, 40, 40),
                };
                ui.label(egui::RichText::new(&msg.message).color(color).strong());
            }
        });
    }

    fn ui_sticks_panel(&mut self, ui: &mut egui::Ui) {
        let mut updates: Vec<(StickSide, crate::domain::models::StickEvent)> = Vec::new();

        Components::section_card(ui, "Sticks", |ui| {
            ui.columns(2, |columns| {
                columns[0].vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Left Stick").strong());
                    ui.label("Strafe / Climb");
                    for event in self.left_stick.show(ui, 160.0) {
                        updates.push((StickSide::Left, event));
                    }
                });
                columns[1].vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Right Stick").strong());
                    ui.label("Forward / Turn");
                    for event in self.right_stick.show(ui, 160.0) {
                        updates.push((StickSide::Right, event));
                    }
                });
            });
        });

        // Every merge forwards the full record; the worker answers
        // NotConnected while the link is down and the frame is dropped.
        for (side, event) in updates {
            let record = self.control.apply(side, event);
            let _ = self.link_tx.send(LinkCommand::Send(record));
        }
    }

    fn ui_record_panel(&mut self, ui: &mut egui::Ui) {
        let record = self.control.record();
        Components::section_card(ui, "Current Values", |ui| {
            egui::Grid::new("record_grid")
                .spacing([36.0, 6.0])
                .show(ui, |ui| {
                    ui.label("id:");
                    ui.label(format!("{}", record.id));
                    ui.end_row();

                    for (label, value) in [
                        ("x (forward):", record.x),
                        ("y (strafe):", record.y),
                        ("z (climb):", record.z),
                        ("yaw (turn):", record.yaw),
                        ("pitch:", record.pitch),
                        ("roll:", record.roll),
                    ] {
                        ui.label(label);
                        ui.label(format!("{:+.3}", value));
                        ui.end_row();
                    }
                });
        });
    }

    fn ui_settings_panel(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Link Settings")
            .default_open(false)
            .show(ui, |ui| {
                egui::Grid::new("link_settings_grid")
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Name prefixes:");
                        ui.text_edit_singleline(&mut self.link_prefix_input);
                        ui.end_row();

                        ui.label("Service UUID:");
                        ui.text_edit_singleline(&mut self.settings.get_mut().link.service_uuid);
                        ui.end_row();

                        ui.label("Telemetry UUID:");
                        ui.text_edit_singleline(
                            &mut self.settings.get_mut().link.telemetry_char_uuid,
                        );
                        ui.end_row();

                        ui.label("Control UUID:");
                        ui.text_edit_singleline(
                            &mut self.settings.get_mut().link.control_char_uuid,
                        );
                        ui.end_row();
                    });

                if ui.button("Save").clicked() {
                    self.settings.get_mut().link.device_name_prefixes = self
                        .link_prefix_input
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();

                    match self.settings.save() {
                        Ok(()) => {
                            self.status_message = Some(StatusMessage {
                                message: "Settings saved. Link changes apply after restart."
                                    .to_string(),
                                severity: MessageSeverity::Info,
                            });
                        }
                        Err(e) => {
                            warn!("Failed to save settings: {e}");
                            self.status_message = Some(StatusMessage {
                                message: format!("Failed to save settings: {e}"),
                                severity: MessageSeverity::Error,
                            });
                        }
                    }
                }
            });
    }
}

impl eframe::App for DroneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::ConnectionStatus(state) => self.connection_status = state,
                AppEvent::LogMessage(msg) => self.status_message = Some(msg),
            }
        }

        ctx.request_repaint();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.label(egui::RichText::new("FPV Drone Controller").strong());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        crate::presentation::theme::configure_theme(ctx, self.is_dark_mode);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(820.0);
                    ui.add_space(16.0);

                    self.ui_connection_panel(ui);
                    ui.add_space(12.0);
                    self.ui_sticks_panel(ui);
                    ui.add_space(12.0);
                    self.ui_record_panel(ui);
                    ui.add_space(12.0);
                    self.ui_settings_panel(ui);

                    ui.add_space(40.0);
                });
            });
        });
    }
}

fn spawn_link_worker(
    options: LinkOptions,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    command_tx: mpsc::UnboundedSender<LinkCommand>,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
) {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime for the link worker");

        rt.block_on(async move {
            let tx_clone = event_tx.clone();
            let mut link = LinkManager::new(options, event_tx, command_tx);

            while let Some(cmd) = command_rx.recv().await {
                match cmd {
                    LinkCommand::Connect => {
                        if let Err(e) = link.connect().await {
                            error!("Connection failed: {e}");
                            let _ = tx_clone.send(AppEvent::LogMessage(StatusMessage {
                                message: format!("Connection failed: {e}"),
                                severity: MessageSeverity::Error,
                            }));
                        }
                    }
                    LinkCommand::Disconnect => link.disconnect(),
                    LinkCommand::Send(record) => match link.send(&record).await {
                        Ok(()) => {}
                        Err(LinkError::NotConnected) => {
                            trace!("Dropping control frame, link not connected");
                        }
                        Err(e) => {
                            warn!("Send failed: {e}");
                            let _ = tx_clone.send(AppEvent::LogMessage(StatusMessage {
                                message: format!("Send failed: {e}"),
                                severity: MessageSeverity::Warning,
                            }));
                        }
                    },
                    LinkCommand::ConnectionLost => link.handle_connection_lost(),
                }
                trace!("Link state after command: {:?}", link.state());
            }
        });
    });
}
