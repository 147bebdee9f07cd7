//! Panel components for the frontend UI
//!
//! Each panel renders one piece of the viewer and reports what the user did
//! as [`AppAction`]s.
//!
//! # Panels
//!
//! - [`LeaderboardPanel`] - Live ranking; clicking a row focuses the driver
//! - [`SessionPanel`] - Load form, sessions on disk and recent sessions
//! - [`AnalysisPanel`] - Tyre strategy, lap times, sectors, weather and lap
//!   comparison

use egui::{Color32, RichText, Ui};

use crate::config::RecentSession;
use crate::frontend::plot::render_lap_comparison;
use crate::frontend::state::{AppAction, LoadForm, SessionAnalysis};
use crate::frontend::toolbar::format_session_time;
use crate::session::analysis::{driver_telemetry, sector_analysis};
use crate::session::buffer::FrameBuffer;
use crate::session::types::{SessionInfo, SessionKind};
use crate::sinks::LeaderboardModel;
use crate::types::{DriverColor, TyreCompound};

fn driver_color(session: Option<&SessionInfo>, code: &str) -> Color32 {
    let color = session
        .and_then(|s| s.driver(code))
        .map(|d| d.color)
        .unwrap_or_else(DriverColor::default);
    Color32::from_rgb(color.rgb[0], color.rgb[1], color.rgb[2])
}

fn tyre_label(tyre: TyreCompound) -> RichText {
    let [r, g, b] = tyre.color();
    RichText::new(tyre.short_label())
        .color(Color32::from_rgb(r, g, b))
        .strong()
}

/// Renders the live leaderboard
pub struct LeaderboardPanel;

impl LeaderboardPanel {
    pub fn render(
        ui: &mut Ui,
        leaderboard: &LeaderboardModel,
        session: Option<&SessionInfo>,
        focus: Option<&str>,
    ) -> Vec<AppAction> {
        let mut actions = Vec::new();

        ui.heading("Leaderboard");
        if let (Some(session), Some(leader)) = (session, leaderboard.leader()) {
            ui.label(format!("Lap {} / {}", leader.lap, session.total_laps));
        }
        ui.separator();

        if leaderboard.entries().is_empty() {
            ui.label(RichText::new("No frame shown yet").italics());
            return actions;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("leaderboard_grid")
                .num_columns(4)
                .striped(true)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    for entry in leaderboard.entries() {
                        ui.label(RichText::new(format!("{:>2}", entry.position)).monospace());

                        let focused = focus == Some(entry.code.as_str());
                        let code = RichText::new(&entry.code)
                            .color(driver_color(session, &entry.code))
                            .strong();
                        if ui
                            .selectable_label(focused, code)
                            .on_hover_text("Show telemetry")
                            .clicked()
                        {
                            let next = if focused { None } else { Some(entry.code.clone()) };
                            actions.push(AppAction::FocusDriver(next));
                        }

                        ui.label(tyre_label(entry.tyre));

                        let gap = if entry.position == 1 {
                            "Leader".to_string()
                        } else {
                            format!("+{:.0} m", entry.gap_to_leader)
                        };
                        ui.label(RichText::new(gap).monospace().small());
                        ui.end_row();
                    }
                });
        });

        actions
    }
}

/// Renders the session load form and the recent list
pub struct SessionPanel;

impl SessionPanel {
    pub fn render(
        ui: &mut Ui,
        form: &mut LoadForm,
        recent: &[RecentSession],
        loading: bool,
    ) -> Vec<AppAction> {
        let mut actions = Vec::new();

        ui.heading("Session");
        egui::Grid::new("load_form_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Year:");
                let year = ui.add(egui::DragValue::new(&mut form.year).range(1950..=2100));
                if year.changed() {
                    actions.push(AppAction::RefreshAvailable(form.year));
                }
                ui.end_row();

                ui.label("Round:");
                ui.add(egui::DragValue::new(&mut form.round).range(1..=30));
                ui.end_row();

                ui.label("Session:");
                egui::ComboBox::from_id_salt("load_form_kind")
                    .selected_text(form.kind.display_name())
                    .show_ui(ui, |ui| {
                        for kind in SessionKind::ALL {
                            ui.selectable_value(&mut form.kind, kind, kind.display_name());
                        }
                    });
                ui.end_row();
            });

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!loading, egui::Button::new("Load"))
                .clicked()
            {
                actions.push(AppAction::LoadSession(form.request()));
            }
            if ui.button("Refresh").on_hover_text("Scan the data directory").clicked() {
                actions.push(AppAction::RefreshAvailable(form.year));
            }
        });

        ui.separator();
        ui.label(RichText::new(format!("On disk ({})", form.year)).strong());
        if form.available.is_empty() {
            ui.label(RichText::new("None found").italics().small());
        }
        for request in form.available.clone() {
            let label = format!("Round {} - {}", request.round, request.kind);
            if ui
                .add_enabled(!loading, egui::Button::new(label).small())
                .clicked()
            {
                form.set_request(request);
                actions.push(AppAction::LoadSession(request));
            }
        }

        if !recent.is_empty() {
            ui.separator();
            ui.label(RichText::new("Recent").strong());
            for entry in recent {
                let response = ui
                    .add_enabled(!loading, egui::Button::new(entry.title.as_str()).small())
                    .on_hover_text(format!(
                        "Last opened {}",
                        entry.last_opened.format("%Y-%m-%d %H:%M")
                    ));
                if response.clicked() {
                    form.set_request(entry.request);
                    actions.push(AppAction::LoadSession(entry.request));
                }
            }
        }

        actions
    }
}

/// Lap picked for the comparison plot, kept between repaints
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisSelection {
    pub lap: u32,
}

/// Renders the session analysis window body
pub struct AnalysisPanel;

impl AnalysisPanel {
    pub fn render(
        ui: &mut Ui,
        analysis: &SessionAnalysis,
        buffer: &FrameBuffer,
        session: Option<&SessionInfo>,
        focus: Option<&str>,
        selection: &mut AnalysisSelection,
    ) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::CollapsingHeader::new("Lap times")
                .default_open(true)
                .show(ui, |ui| Self::render_lap_times(ui, analysis, session));

            egui::CollapsingHeader::new("Tyre strategy")
                .default_open(true)
                .show(ui, |ui| Self::render_strategy(ui, analysis, session));

            egui::CollapsingHeader::new("Sectors")
                .default_open(false)
                .show(ui, |ui| Self::render_sectors(ui, session, focus));

            egui::CollapsingHeader::new("Weather")
                .default_open(false)
                .show(ui, |ui| Self::render_weather(ui, analysis));

            egui::CollapsingHeader::new("Lap comparison")
                .default_open(true)
                .show(ui, |ui| {
                    Self::render_comparison(ui, analysis, buffer, focus, selection)
                });
        });
    }

    fn render_lap_times(ui: &mut Ui, analysis: &SessionAnalysis, session: Option<&SessionInfo>) {
        egui::Grid::new("lap_times_grid")
            .num_columns(4)
            .striped(true)
            .show(ui, |ui| {
                ui.label(RichText::new("Driver").strong());
                ui.label(RichText::new("Laps").strong());
                ui.label(RichText::new("Fastest").strong());
                ui.label(RichText::new("Average").strong());
                ui.end_row();

                for (code, summary) in &analysis.lap_times {
                    ui.colored_label(driver_color(session, code), code.as_str());
                    ui.label(summary.laps.len().to_string());
                    match summary.fastest() {
                        Some(best) => ui.label(format!(
                            "{} (L{})",
                            format_session_time(best.time.as_secs_f64()),
                            best.lap
                        )),
                        None => ui.label("-"),
                    };
                    match summary.average() {
                        Some(avg) => ui.label(format_session_time(avg.as_secs_f64())),
                        None => ui.label("-"),
                    };
                    ui.end_row();
                }
            });
    }

    fn render_strategy(ui: &mut Ui, analysis: &SessionAnalysis, session: Option<&SessionInfo>) {
        egui::Grid::new("strategy_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (code, stints) in &analysis.strategy {
                    ui.colored_label(driver_color(session, code), code.as_str());
                    ui.horizontal(|ui| {
                        for stint in stints {
                            ui.label(tyre_label(stint.compound)).on_hover_text(format!(
                                "{}: laps {}-{}",
                                stint.compound, stint.start_lap, stint.end_lap
                            ));
                            ui.label(RichText::new(format!("{}", stint.laps())).small());
                        }
                    });
                    ui.end_row();
                }
            });
    }

    fn render_sectors(ui: &mut Ui, session: Option<&SessionInfo>, focus: Option<&str>) {
        let Some(session) = session.filter(|s| !s.sectors.is_empty()) else {
            ui.label(RichText::new("No sector times in this session").italics());
            return;
        };
        let secs = |d: std::time::Duration| format!("{:.3}", d.as_secs_f64());

        let Some(code) = focus else {
            // Best sectors of every timed driver
            egui::Grid::new("best_sectors_grid")
                .num_columns(5)
                .striped(true)
                .show(ui, |ui| {
                    for header in ["Driver", "S1", "S2", "S3", "Ideal"] {
                        ui.label(RichText::new(header).strong());
                    }
                    ui.end_row();

                    for code in session.sectors.keys() {
                        let analysis = sector_analysis(session, code);
                        ui.colored_label(driver_color(Some(session), code), code.as_str());
                        for best in analysis.best {
                            ui.label(best.map(secs).unwrap_or_else(|| "-".to_string()));
                        }
                        match analysis.ideal_lap() {
                            Some(ideal) => ui.label(format_session_time(ideal.as_secs_f64())),
                            None => ui.label("-"),
                        };
                        ui.end_row();
                    }
                });
            return;
        };

        let analysis = sector_analysis(session, code);
        if analysis.laps.is_empty() {
            ui.label(RichText::new(format!("No sector times for {}", code)).italics());
            return;
        }

        egui::Grid::new("driver_sectors_grid")
            .num_columns(5)
            .striped(true)
            .show(ui, |ui| {
                for header in ["Lap", "S1", "S2", "S3", "Lap time"] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for lap in &analysis.laps {
                    ui.label(lap.lap.to_string());
                    for (sector, time) in lap.sectors().into_iter().enumerate() {
                        let text = RichText::new(secs(time));
                        if analysis.is_best(lap, sector) {
                            ui.label(text.color(Color32::from_rgb(170, 80, 230)).strong());
                        } else {
                            ui.label(text);
                        }
                    }
                    ui.label(format_session_time(lap.total().as_secs_f64()));
                    ui.end_row();
                }
            });
    }

    fn render_weather(ui: &mut Ui, analysis: &SessionAnalysis) {
        if analysis.weather.is_empty() {
            ui.label(RichText::new("No weather data in this session").italics());
            return;
        }

        egui::Grid::new("weather_grid")
            .num_columns(5)
            .striped(true)
            .show(ui, |ui| {
                for header in ["Time", "Track", "Air", "Humidity", "Rain"] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for point in &analysis.weather {
                    let sample = &point.sample;
                    ui.label(format_session_time(point.time.as_secs_f64()));
                    ui.label(format!("{:.1}°C", sample.track_temp));
                    ui.label(format!("{:.1}°C", sample.air_temp));
                    ui.label(format!("{:.0}%", sample.humidity));
                    ui.label(if sample.rainfall { "Yes" } else { "No" });
                    ui.end_row();
                }
            });
    }

    fn render_comparison(
        ui: &mut Ui,
        analysis: &SessionAnalysis,
        buffer: &FrameBuffer,
        focus: Option<&str>,
        selection: &mut AnalysisSelection,
    ) {
        let Some(code) = focus else {
            ui.label(RichText::new("Focus a driver to compare laps").italics());
            return;
        };

        let fastest = analysis.lap_times.get(code).and_then(|s| s.fastest());
        if selection.lap == 0 {
            selection.lap = fastest.map(|l| l.lap).unwrap_or(1);
        }

        ui.horizontal(|ui| {
            ui.label(format!("{} lap:", code));
            ui.add(egui::DragValue::new(&mut selection.lap).range(1..=u32::MAX));
            if let Some(best) = fastest {
                ui.label(RichText::new(format!("fastest: L{}", best.lap)).small());
            }
        });

        let selected = driver_telemetry(buffer, code, Some(selection.lap));
        if selected.is_empty() {
            ui.label(RichText::new("No data for that lap").italics());
            return;
        }

        let reference = fastest
            .filter(|best| best.lap != selection.lap)
            .map(|best| (best.lap, driver_telemetry(buffer, code, None)));

        let selected_name = format!("Lap {}", selection.lap);
        let reference_name = reference
            .as_ref()
            .map(|(lap, _)| format!("Fastest (lap {})", lap));

        render_lap_comparison(
            ui,
            (selected_name.as_str(), selected.as_slice()),
            reference_name
                .as_deref()
                .zip(reference.as_ref().map(|(_, points)| points.as_slice())),
        );
    }
}
