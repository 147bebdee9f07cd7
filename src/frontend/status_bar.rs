//! Status bar panel - bottom bar showing session, frame and weather info.

use egui::{Color32, RichText, Ui};

use crate::session::controller::PlaybackSnapshot;
use crate::session::types::SessionInfo;
use crate::types::WeatherSample;

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub session: Option<&'a SessionInfo>,
    pub snapshot: &'a PlaybackSnapshot,
    /// Frame currently on screen
    pub frame_index: Option<usize>,
    pub weather: Option<&'a WeatherSample>,
    pub last_error: Option<&'a str>,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        match ctx.session {
            Some(session) => {
                ui.colored_label(Color32::GREEN, "●");
                ui.label(RichText::new(session.title()).small());
                ui.separator();
                ui.label(RichText::new(format!("Laps: {}", session.total_laps)).small());
            }
            None => {
                ui.colored_label(Color32::GRAY, "●");
                ui.label(RichText::new("No session").small());
            }
        }

        ui.separator();

        let frame_text = match ctx.frame_index {
            Some(index) => format!("Frame: {} / {}", index, ctx.snapshot.len),
            None => format!("Frame: - / {}", ctx.snapshot.len),
        };
        ui.label(RichText::new(frame_text).small());

        ui.separator();
        ui.label(RichText::new(format!("Rate: {}x", ctx.snapshot.rate)).small());

        if let Some(weather) = ctx.weather {
            ui.separator();
            ui.label(
                RichText::new(format!(
                    "Track {:.1}°C  Air {:.1}°C  Hum {:.0}%  Wind {:.1} m/s",
                    weather.track_temp, weather.air_temp, weather.humidity, weather.wind_speed
                ))
                .small(),
            );
            if weather.rainfall {
                ui.colored_label(Color32::LIGHT_BLUE, RichText::new("Rain").small());
            }
        }

        // === Error message (right-aligned) ===
        if let Some(error) = ctx.last_error {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new(error).small());
            });
        }
    });
}
