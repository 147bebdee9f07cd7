//! Toolbar panel - transport controls, rate, direction and the scrub bar.
//!
//! Sits below the menu bar, above the track map.

use egui::{Color32, RichText, Ui};

use crate::frontend::state::AppAction;
use crate::session::controller::PlaybackSnapshot;
use crate::session::types::{Direction, PlaybackStatus};

/// Rates offered in the rate selector
pub const RATE_PRESETS: [f64; 6] = [0.5, 1.0, 2.0, 4.0, 6.0, 8.0];

/// Frames skipped by the coarse step buttons (one second of session time)
pub const COARSE_STEP: isize = 25;

/// Context needed to render the toolbar.
pub struct ToolbarContext<'a> {
    pub snapshot: &'a PlaybackSnapshot,
    pub loading: bool,
}

/// Render the transport toolbar.
///
/// Returns actions to be applied by the app.
pub fn render_toolbar(ui: &mut Ui, ctx: &ToolbarContext<'_>) -> Vec<AppAction> {
    let mut actions = Vec::new();
    let has_frames = ctx.snapshot.len > 0 && !ctx.loading;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 4.0;

        ui.add_enabled_ui(has_frames, |ui| {
            render_transport_group(ui, ctx, &mut actions);
            ui.separator();
            render_rate_group(ui, ctx, &mut actions);
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            render_info_group(ui, ctx);
        });
    });

    ui.add_enabled_ui(has_frames, |ui| {
        render_scrub_bar(ui, ctx, &mut actions);
    });

    actions
}

fn render_transport_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    let playing = ctx.snapshot.status.is_playing();

    if ui
        .button(format!("⏪ {}", COARSE_STEP))
        .on_hover_text("Back one second (Shift+Left)")
        .clicked()
    {
        actions.push(AppAction::Step(-COARSE_STEP));
    }
    if ui.button("◀").on_hover_text("Previous frame (Left)").clicked() {
        actions.push(AppAction::Step(-1));
    }

    let (label, fill) = if playing {
        ("Pause", Color32::from_rgb(160, 120, 40))
    } else {
        ("Play", Color32::from_rgb(50, 120, 50))
    };
    let btn = egui::Button::new(RichText::new(label).color(Color32::WHITE)).fill(fill);
    if ui.add(btn).on_hover_text("Play/pause (Space)").clicked() {
        actions.push(AppAction::TogglePlay);
    }

    let btn = egui::Button::new(RichText::new("Stop").color(Color32::WHITE))
        .fill(Color32::from_rgb(180, 50, 50));
    if ui.add(btn).on_hover_text("Stop and rewind (Home)").clicked() {
        actions.push(AppAction::Stop);
    }

    if ui.button("▶").on_hover_text("Next frame (Right)").clicked() {
        actions.push(AppAction::Step(1));
    }
    if ui
        .button(format!("{} ⏩", COARSE_STEP))
        .on_hover_text("Forward one second (Shift+Right)")
        .clicked()
    {
        actions.push(AppAction::Step(COARSE_STEP));
    }
}

fn render_rate_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    ui.label("Rate:");
    egui::ComboBox::from_id_salt("toolbar_rate_selector")
        .selected_text(format!("{}x", ctx.snapshot.rate))
        .width(60.0)
        .show_ui(ui, |ui| {
            for rate in RATE_PRESETS {
                if ui
                    .selectable_label(ctx.snapshot.rate == rate, format!("{}x", rate))
                    .clicked()
                {
                    actions.push(AppAction::SetRate(rate));
                }
            }
        });

    let reverse = ctx.snapshot.direction == Direction::Backward;
    if ui
        .selectable_label(reverse, "Reverse")
        .on_hover_text("Play backwards (R)")
        .clicked()
    {
        actions.push(AppAction::SetDirection(ctx.snapshot.direction.reversed()));
    }
}

fn render_scrub_bar(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    let last = ctx.snapshot.len.saturating_sub(1);
    let mut position = ctx.snapshot.cursor.min(last);

    ui.spacing_mut().slider_width = (ui.available_width() - 80.0).max(100.0);
    let response = ui.add(egui::Slider::new(&mut position, 0..=last).show_value(true));
    if response.changed() {
        actions.push(AppAction::Seek(position));
    }
}

fn render_info_group(ui: &mut Ui, ctx: &ToolbarContext<'_>) {
    if ctx.loading {
        ui.spinner();
        ui.label("Loading...");
        return;
    }

    ui.label(
        RichText::new(format!(
            "{} / {}",
            format_session_time(ctx.snapshot.current_time.as_secs_f64()),
            format_session_time(ctx.snapshot.duration.as_secs_f64())
        ))
        .monospace(),
    );

    let (color, text) = match ctx.snapshot.status {
        PlaybackStatus::Playing => (Color32::GREEN, "Playing"),
        PlaybackStatus::Paused => (Color32::YELLOW, "Paused"),
        PlaybackStatus::Stopped => (Color32::GRAY, "Stopped"),
    };
    ui.colored_label(color, text);
}

/// Format seconds as `h:mm:ss.d`
pub fn format_session_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.floor() as u64;
    let tenths = ((seconds - whole as f64) * 10.0).floor() as u64;
    format!(
        "{}:{:02}:{:02}.{}",
        whole / 3600,
        (whole / 60) % 60,
        whole % 60,
        tenths
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_session_time() {
        assert_eq!(format_session_time(0.0), "0:00:00.0");
        assert_eq!(format_session_time(61.25), "0:01:01.2");
        assert_eq!(format_session_time(3725.9), "1:02:05.9");
        assert_eq!(format_session_time(-3.0), "0:00:00.0");
    }
}
