use eframe::egui::{self, Color32, RichText, Ui};

use crate::color::STYLE_COLORS;
use crate::plotting::{LineKind, Marker, cycle_label};
use crate::state::{AppState, NoticeLevel};
use crate::ui::panels::file_combo;

/// Render the oldest pending notice as a centred modal window.
pub fn notice_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(notice) = state.notices.front() else {
        return;
    };
    let color = match notice.level {
        NoticeLevel::Info => ctx.style().visuals.text_color(),
        NoticeLevel::Error => Color32::RED,
    };
    let mut dismissed = false;

    egui::Window::new(&notice.title)
        .id(egui::Id::new("notice"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(RichText::new(&notice.message).color(color));
            ui.add_space(8.0);
            if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                dismissed = true;
            }
        });

    if dismissed {
        state.dismiss_notice();
    }
}

/// Close-loop / inversion dialog: choose a file and tick the columns.
pub fn transform_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(dialog) = &mut state.transform_dialog else {
        return;
    };
    let n_files = state.files.len();
    let mut file_change = None;
    let mut apply = false;
    let mut cancel = false;

    egui::Window::new(dialog.kind.title())
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("File:");
                file_change = file_combo(ui, "transform_file", n_files, dialog.file);
            });
            ui.separator();

            if dialog.columns.is_empty() {
                ui.weak("Choose a file.");
            }
            for (name, ticked) in dialog.columns.iter_mut() {
                ui.checkbox(ticked, name.as_str());
            }

            ui.add_space(8.0);
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Apply").clicked() {
                    apply = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if let Some(file) = file_change {
        state.set_transform_file(file);
    }
    if cancel {
        state.transform_dialog = None;
    } else if apply {
        state.apply_transform();
    }
}

/// Per-cycle colour / marker / line style dialog.
pub fn style_window(ctx: &egui::Context, state: &mut AppState) {
    let n_cycles = state.plot.as_ref().map_or(0, |p| p.n_cycles());
    let Some(form) = &mut state.style_form else {
        return;
    };
    let mut apply = false;
    let mut cancel = false;

    egui::Window::new("Customize style")
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("style_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("Cycle");
                    egui::ComboBox::from_id_salt("style_cycle")
                        .selected_text(cycle_label(form.cycle))
                        .show_ui(ui, |ui: &mut Ui| {
                            for c in 0..n_cycles {
                                ui.selectable_value(&mut form.cycle, c, cycle_label(c));
                            }
                        });
                    ui.end_row();

                    ui.label("Colour");
                    egui::ComboBox::from_id_salt("style_color")
                        .selected_text(form.color)
                        .show_ui(ui, |ui: &mut Ui| {
                            for name in STYLE_COLORS {
                                ui.selectable_value(&mut form.color, name, name);
                            }
                        });
                    ui.end_row();

                    ui.label("Marker");
                    egui::ComboBox::from_id_salt("style_marker")
                        .selected_text(form.marker.symbol())
                        .show_ui(ui, |ui: &mut Ui| {
                            for m in Marker::ALL {
                                ui.selectable_value(&mut form.marker, m, m.symbol());
                            }
                        });
                    ui.end_row();

                    ui.label("Line style");
                    egui::ComboBox::from_id_salt("style_line")
                        .selected_text(form.line.symbol())
                        .show_ui(ui, |ui: &mut Ui| {
                            for l in LineKind::ALL {
                                ui.selectable_value(&mut form.line, l, l.symbol());
                            }
                        });
                    ui.end_row();
                });

            ui.add_space(8.0);
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Apply").clicked() {
                    apply = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if cancel {
        state.style_form = None;
    } else if apply {
        state.apply_style();
    }
}
