use eframe::egui::{RichText, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, Points};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Hysteresis plot (central panel)
// ---------------------------------------------------------------------------

/// Render the loops and fit overlays in the central panel.
pub fn hysteresis_plot(ui: &mut Ui, state: &mut AppState) {
    let Some(model) = &state.plot else {
        ui.centered_and_justified(|ui: &mut Ui| {
            let hint = if state.files.is_empty() {
                "Open a file to view loops  (File → Open…)"
            } else {
                "Select the column pairs, then press \"Create plot\""
            };
            ui.heading(hint);
        });
        return;
    };

    let response = Plot::new(("hysteresis_plot", state.plot_count))
        .legend(Legend::default())
        .x_axis_label("H [Oe]")
        .y_axis_label("M/M_sat")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for curve in &model.curves {
                let style = curve.style;
                plot_ui.line(
                    Line::new(PlotPoints::from(curve.points.clone()))
                        .name(&curve.name)
                        .color(style.color)
                        .style(style.line.style())
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(curve.points.clone()))
                        .name(&curve.name)
                        .color(style.color)
                        .shape(style.marker.shape())
                        .radius(2.5),
                );
            }

            for overlay in &model.overlays {
                plot_ui.line(
                    Line::new(PlotPoints::from(overlay.points.clone()))
                        .name(&overlay.name)
                        .color(overlay.color)
                        .style(LineStyle::Dashed { length: 8.0 })
                        .width(2.0),
                );
            }

            let bounds = plot_ui.plot_bounds();
            (
                (bounds.min()[0], bounds.max()[0]),
                plot_ui.pointer_coordinate(),
            )
        });

    let (x_range, pointer) = response.inner;
    state.visible_x_range = Some(x_range);

    if let Some(p) = pointer {
        let text = format!("H = {:.4}   M = {:.4}", p.x, p.y);
        response.response.on_hover_text_at_pointer(RichText::new(text).monospace());
    }
}
