use eframe::egui::{self, Color32, Key, RichText, ScrollArea, TextEdit, Ui};
use egui_extras::{Column, TableBuilder};

use crate::console::LineKind;
use crate::state::AppState;

/// Console window: scroll-back, input line and the variable table.
pub fn console_window(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_console {
        return;
    }
    let mut open = true;
    let mut submit = false;

    egui::Window::new("Console")
        .open(&mut open)
        .resizable(true)
        .default_size([520.0, 420.0])
        .show(ctx, |ui| {
            ScrollArea::vertical()
                .id_salt("console_history")
                .max_height(220.0)
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    for line in &state.console.history {
                        let text = RichText::new(&line.text).monospace();
                        ui.label(match line.kind {
                            LineKind::Input => text.strong(),
                            LineKind::Output => text,
                            LineKind::Error => text.color(Color32::RED),
                        });
                    }
                });

            ui.separator();
            ui.horizontal(|ui: &mut Ui| {
                ui.monospace(">>>");
                let resp = ui.add(
                    TextEdit::singleline(&mut state.console.input)
                        .code_editor()
                        .hint_text("help")
                        .desired_width(f32::INFINITY),
                );
                if resp.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                    submit = true;
                    resp.request_focus();
                } else if resp.has_focus() {
                    if ui.input(|i| i.key_pressed(Key::ArrowUp)) {
                        state.console.recall_previous();
                    } else if ui.input(|i| i.key_pressed(Key::ArrowDown)) {
                        state.console.recall_next();
                    }
                }
            });

            ui.separator();
            ui.strong(format!("Variables ({})", state.fit_results.len()));
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto().at_least(120.0))
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Name");
                    });
                    header.col(|ui| {
                        ui.strong("Value");
                    });
                })
                .body(|mut body| {
                    for (name, value) in state.fit_results.iter() {
                        body.row(18.0, |mut row| {
                            row.col(|ui| {
                                ui.monospace(name);
                            });
                            row.col(|ui| {
                                ui.monospace(format!("{value:.6e}"));
                            });
                        });
                    }
                });
        });

    state.show_console = open;
    if submit {
        state.submit_console();
    }
}
