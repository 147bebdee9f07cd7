//! Plot rendering for the telemetry chart and lap comparison
//!
//! The live chart shows the focused driver's recent history with one plot per
//! channel stacked vertically and linked on the time axis. The lap
//! comparison overlays the speed trace of two laps against lap distance.

use egui::{Color32, Ui};
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints, VLine};

use crate::session::analysis::LapTelemetryPoint;
use crate::sinks::{TelemetryChannel, TelemetryChart};

const CHANNEL_COLORS: [Color32; 4] = [
    Color32::from_rgb(100, 180, 255),
    Color32::from_rgb(80, 220, 100),
    Color32::from_rgb(240, 80, 80),
    Color32::from_rgb(220, 200, 80),
];

/// Render the live telemetry chart
pub fn render_telemetry_chart(ui: &mut Ui, chart: &TelemetryChart) {
    let Some(code) = chart.focus() else {
        ui.centered_and_justified(|ui| {
            ui.label("Select a driver in the leaderboard to show telemetry");
        });
        return;
    };

    let current_time = chart.latest().map(|s| s.time);
    let height = (ui.available_height() / TelemetryChannel::ALL.len() as f32 - 6.0).max(60.0);

    for (channel, color) in TelemetryChannel::ALL.into_iter().zip(CHANNEL_COLORS) {
        let plot = Plot::new(("telemetry", channel.label()))
            .height(height)
            .link_axis("telemetry_time", [true, false])
            .link_cursor("telemetry_time", [true, false])
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_axes([false, true])
            .y_axis_label(channel.label())
            .legend(Legend::default().position(Corner::LeftTop));

        plot.show(ui, |plot_ui| {
            let line = Line::new(
                format!("{} {}", code, channel.label()),
                PlotPoints::from(chart.series(channel)),
            )
            .color(color)
            .width(1.5);
            plot_ui.line(line);

            if let Some(time) = current_time {
                let vline = VLine::new("current_time", time)
                    .color(Color32::from_rgba_unmultiplied(255, 255, 255, 64))
                    .width(1.0);
                plot_ui.vline(vline);
            }
        });
    }
}

fn speed_trace(points: &[LapTelemetryPoint]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.distance, p.speed]).collect()
}

/// Overlay two laps' speed traces against lap distance
pub fn render_lap_comparison(
    ui: &mut Ui,
    selected: (&str, &[LapTelemetryPoint]),
    reference: Option<(&str, &[LapTelemetryPoint])>,
) {
    let plot = Plot::new("lap_comparison")
        .height(220.0)
        .allow_zoom(true)
        .allow_drag(true)
        .x_axis_label("Lap distance")
        .y_axis_label("Speed (km/h)")
        .legend(Legend::default().position(Corner::RightTop));

    plot.show(ui, |plot_ui| {
        let (name, points) = selected;
        plot_ui.line(
            Line::new(name, PlotPoints::from(speed_trace(points)))
                .color(CHANNEL_COLORS[0])
                .width(1.5),
        );

        if let Some((name, points)) = reference {
            plot_ui.line(
                Line::new(name, PlotPoints::from(speed_trace(points)))
                    .color(Color32::from_gray(160))
                    .width(1.0),
            );
        }
    });
}
