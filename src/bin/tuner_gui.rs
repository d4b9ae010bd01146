/// Staged LQR Robot Parameter Tuner GUI
///
/// Tabbed panel for the three gain stages plus advanced parameters, pushing
/// values to the robot over UDP. All sends happen on the UI thread; the
/// controller's scheduled-send queue is drained from the frame tick.
///
/// Run with: cargo run --bin tuner_gui

use std::time::{Duration, Instant};

use chrono::Local;
use clap::Parser;
use eframe::egui;
use egui::Color32;

use lqr_tuner::controller::{TabContext, TunerController};
use lqr_tuner::params::{
    K1_MAX, K1_MIN, K2_MAX, K2_MIN, OFFSET_MAX, OFFSET_MIN, SMOOTHING_MAX, SMOOTHING_MIN,
};
use lqr_tuner::protocol::ROBOT_PORT;
use lqr_tuner::robot_link::{ConnectionState, RobotLink, SendError};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Robot IP address to prefill in the connection field
    #[arg(long, default_value = "192.168.1.100")]
    host: String,
}

struct TunerGui {
    controller: TunerController,
    ip_input: String,
    active_tab: TabContext,
    status_log: String,
}

impl TunerGui {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let link = RobotLink::new(&args.host)?;
        let mut gui = Self {
            controller: TunerController::new(link),
            ip_input: args.host.clone(),
            active_tab: TabContext::Stage(1),
            status_log: String::new(),
        };
        gui.log("Ready to connect... Robot needs ALL stage gains before balancing starts!");
        Ok(gui)
    }

    fn log(&mut self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        self.status_log.push_str(&format!("{} - {}\n", timestamp, message));
        // Keep log size manageable
        if self.status_log.len() > 10000 {
            self.status_log = self.status_log.split_off(self.status_log.len() - 5000);
        }
    }

    fn drain_controller_status(&mut self) {
        for line in self.controller.drain_status() {
            self.log(&line);
        }
    }

    /// Blocking notice for explicit sends attempted while not connected.
    /// Auto-send hits the same precondition silently (log line only), so a
    /// slider drag can't spawn a dialog per frame.
    fn notice_if_blocked(&self, result: Result<(), SendError>) {
        if let Err(SendError::NotConnected) = result {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title("Not Connected")
                .set_description("Please test connection first!")
                .show();
        }
    }

    fn run_test_connection(&mut self) {
        let host = self.ip_input.trim().to_string();
        if let Err(e) = self.controller.test_connection(&host) {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("Connection Error")
                .set_description(format!(
                    "Failed to connect to {}:{}\n\n{}",
                    host, ROBOT_PORT, e
                ))
                .show();
        }
    }

    fn connection_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Robot IP:");
            ui.add(egui::TextEdit::singleline(&mut self.ip_input).desired_width(130.0));
            if ui.button("Test Connection").clicked() {
                self.run_test_connection();
            }
            let (text, color) = match self.controller.state() {
                ConnectionState::Connected => ("● Connected", Color32::from_rgb(39, 174, 96)),
                ConnectionState::Failed => ("● Connection Failed", Color32::from_rgb(231, 76, 60)),
                ConnectionState::Disconnected => ("● Disconnected", Color32::GRAY),
            };
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(color, text);
            });
        });
    }

    fn tab_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.active_tab, TabContext::Stage(1), "Stage 1");
            ui.selectable_value(&mut self.active_tab, TabContext::Stage(2), "Stage 2");
            ui.selectable_value(&mut self.active_tab, TabContext::Stage(3), "Stage 3");
            ui.selectable_value(&mut self.active_tab, TabContext::Advanced, "Advanced");
        });
    }

    fn stage_tab(&mut self, ui: &mut egui::Ui, n: u8) {
        let (title, description) = match n {
            1 => (
                "Stage 1: Small Angles (0-5°)",
                "Smooth control for small deviations\nRecommended: K1=4-8, K2=0.2-0.6",
            ),
            2 => (
                "Stage 2: Medium Angles (5-15°)",
                "Moderate control for medium angles\nRecommended: K1=10-16, K2=1.0-2.5",
            ),
            _ => (
                "Stage 3: Large Angles (15-30°)",
                "Aggressive control for large angles\nRecommended: K1=15-20, K2=2.0-3.5",
            ),
        };
        ui.heading(title);
        ui.label(description);
        ui.separator();

        let idx = (n - 1) as usize;
        let k1_response = ui.add(
            egui::Slider::new(&mut self.controller.store.stages[idx].gains.k1, K1_MIN..=K1_MAX)
                .text("K1 (Angle Gain)")
                .fixed_decimals(3),
        );
        if k1_response.changed() {
            self.controller.param_edited(TabContext::Stage(n), Instant::now());
        }
        let k2_response = ui.add(
            egui::Slider::new(&mut self.controller.store.stages[idx].gains.k2, K2_MIN..=K2_MAX)
                .text("K2 (Angular Velocity Gain)")
                .fixed_decimals(3),
        );
        if k2_response.changed() {
            self.controller.param_edited(TabContext::Stage(n), Instant::now());
        }

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.button(format!("Send Stage {}", n)).clicked() {
                let result = self.controller.send_stage(n);
                self.notice_if_blocked(result);
            }
            if self.controller.store.stage_sent(n) {
                ui.colored_label(Color32::from_rgb(39, 174, 96), "✓ Sent");
            } else {
                ui.colored_label(Color32::from_rgb(231, 76, 60), "Not Sent");
            }
        });
    }

    fn advanced_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Advanced Parameters");
        ui.separator();

        let smooth_response = ui.add(
            egui::Slider::new(&mut self.controller.store.smoothing, SMOOTHING_MIN..=SMOOTHING_MAX)
                .text("Transition Smoothing")
                .fixed_decimals(3),
        );
        if smooth_response.changed() {
            self.controller.param_edited(TabContext::Advanced, Instant::now());
        }
        ui.label("Higher values = smoother transitions between stages");

        ui.add_space(10.0);
        let offset_response = ui.add(
            egui::Slider::new(&mut self.controller.store.offset, OFFSET_MIN..=OFFSET_MAX)
                .text("Pitch Offset (°)")
                .fixed_decimals(3),
        );
        if offset_response.changed() {
            self.controller.param_edited(TabContext::Advanced, Instant::now());
        }
        ui.label("Adjust robot's balance point (+ leans forward, - leans backward)");

        ui.add_space(10.0);
        if ui.button("Send Advanced Params").clicked() {
            let result = self.controller.send_advanced(Instant::now());
            self.notice_if_blocked(result);
        }
    }

    fn control_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut auto = self.controller.auto_send;
            if ui.checkbox(&mut auto, "Auto Send Changes").changed() {
                self.controller.set_auto_send(auto);
            }
            if ui.button("Send All Parameters").clicked() {
                let result = self.controller.send_all(Instant::now());
                self.notice_if_blocked(result);
            }
            if ui.button("Send Current Stage").clicked() {
                let result = self.controller.send_context(self.active_tab, Instant::now());
                self.notice_if_blocked(result);
            }
            if ui.button("Reset All").clicked() {
                self.controller.reset(Instant::now());
            }
        });
    }

    fn status_area(&mut self, ui: &mut egui::Ui) {
        ui.label("Status Log:");
        egui::ScrollArea::vertical()
            .max_height(140.0)
            .auto_shrink([false; 2])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.status_log)
                        .desired_width(f32::INFINITY)
                        .interactive(false)
                        .code_editor(),
                );
            });
    }
}

impl eframe::App for TunerGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.controller.tick(now);
        self.drain_controller_status();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("🤖 Staged LQR Robot Tuner");
            self.connection_row(ui);
            ui.separator();

            self.tab_bar(ui);
            ui.separator();
            match self.active_tab {
                TabContext::Stage(n) => self.stage_tab(ui, n),
                TabContext::Advanced => self.advanced_tab(ui),
            }

            ui.separator();
            self.control_row(ui);
            ui.separator();
            self.status_area(ui);
        });

        if let Some(due) = self.controller.next_due() {
            // Queued sequence steps need timely ticks
            let wait = due.saturating_duration_since(now).min(Duration::from_millis(20));
            ctx.request_repaint_after(wait);
        } else {
            // Idle tick, reserved for a future heartbeat
            ctx.request_repaint_after(Duration::from_secs(2));
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Staged LQR Robot Parameter Tuner")
            .with_inner_size([600.0, 700.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "Staged LQR Robot Parameter Tuner",
        options,
        Box::new(move |_cc| match TunerGui::new(&args) {
            Ok(gui) => Box::new(gui),
            Err(e) => {
                eprintln!("Failed to create TunerGui: {}", e);
                std::process::exit(1);
            }
        }),
    ) {
        eprintln!("GUI error: {}", e);
        std::process::exit(1);
    }
}
