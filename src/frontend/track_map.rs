//! Track map with the circuit outline and one marker per driver

use egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::sinks::SceneModel;
use crate::types::{DriverColor, TrackGeometry};

const OUTLINE_COLOR: Color32 = Color32::from_rgb(90, 90, 90);
const MARKER_RADIUS: f32 = 5.0;
const FOCUS_RADIUS: f32 = 8.0;

/// Context needed to render the map
pub struct TrackMapContext<'a> {
    pub track: &'a TrackGeometry,
    pub scene: &'a SceneModel,
    pub focus: Option<&'a str>,
    pub show_labels: bool,
}

fn to_color32(color: DriverColor) -> Color32 {
    Color32::from_rgb(color.rgb[0], color.rgb[1], color.rgb[2])
}

/// Render the map into the remaining space
pub fn render_track_map(ui: &mut Ui, ctx: &TrackMapContext<'_>) {
    let plot = Plot::new("track_map")
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .show_x(false)
        .show_y(false);

    plot.show(ui, |plot_ui| {
        if !ctx.track.is_empty() {
            let outline = Line::new("Track", PlotPoints::from(ctx.track.as_plot_points()))
                .color(OUTLINE_COLOR)
                .width(6.0);
            plot_ui.line(outline);
        }

        for marker in ctx.scene.markers().filter(|m| m.visible) {
            let focused = ctx.focus == Some(marker.code.as_str());
            let color = to_color32(marker.color);

            let point = Points::new(marker.code.as_str(), vec![[marker.x, marker.y]])
                .color(color)
                .filled(true)
                .radius(if focused { FOCUS_RADIUS } else { MARKER_RADIUS });
            plot_ui.points(point);

            if ctx.show_labels || focused {
                let label = Text::new(
                    format!("{}_label", marker.code),
                    PlotPoint::new(marker.x, marker.y),
                    egui::RichText::new(format!("  {}", marker.code))
                        .color(color)
                        .small(),
                )
                .anchor(egui::Align2::LEFT_CENTER);
                plot_ui.text(label);
            }
        }
    });
}
