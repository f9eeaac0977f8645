use eframe::egui::{self, DragValue, RichText, TextEdit, Ui};

use crate::state::AppState;
use crate::ui::panels::{column_combo, file_combo};

const USAGE: &str = "\
Write the model in x and the parameters, e.g. a*tanh((x - b)/c).
Operators: + - * / ** ^.  Functions: sqrt exp log tanh erf langevin …
Parameters are comma separated; bounds are optional, one per parameter
(leave a field empty for no bound, use inf / -inf for one-sided).";

/// Curve fitting window.
pub fn fit_window(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_fit_window {
        return;
    }
    let mut open = true;
    let mut file_change = None;
    let mut execute = false;
    let mut use_range = false;
    let columns = state
        .fit_form
        .file
        .and_then(|f| state.files.get(f))
        .map(|f| f.table.column_names())
        .unwrap_or_default();
    let n_files = state.files.len();
    let has_range = state.visible_x_range.is_some();
    let form = &mut state.fit_form;

    egui::Window::new("Curve fitting")
        .open(&mut open)
        .resizable(true)
        .default_width(420.0)
        .show(ctx, |ui| {
            egui::Grid::new("fit_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("File");
                    file_change = file_combo(ui, "fit_file", n_files, form.file);
                    ui.end_row();

                    ui.label("x column");
                    column_combo(ui, "fit_x", &columns, &mut form.x_column);
                    ui.end_row();

                    ui.label("y column");
                    column_combo(ui, "fit_y", &columns, &mut form.y_column);
                    ui.end_row();

                    ui.label("x range");
                    ui.horizontal(|ui: &mut Ui| {
                        ui.add(DragValue::new(&mut form.x_start).speed(0.1));
                        ui.label("to");
                        ui.add(DragValue::new(&mut form.x_end).speed(0.1));
                        if ui
                            .add_enabled(has_range, egui::Button::new("use visible x-range"))
                            .clicked()
                        {
                            use_range = true;
                        }
                    });
                    ui.end_row();

                    ui.label("Parameters");
                    ui.add(TextEdit::singleline(&mut form.param_names).hint_text("a, b"));
                    ui.end_row();

                    ui.label("Initial values");
                    ui.add(TextEdit::singleline(&mut form.initial).hint_text("1, 1"));
                    ui.end_row();

                    ui.label("Lower bounds");
                    ui.add(TextEdit::singleline(&mut form.lower).hint_text("-inf, 0"));
                    ui.end_row();

                    ui.label("Upper bounds");
                    ui.add(TextEdit::singleline(&mut form.upper).hint_text("inf, 10"));
                    ui.end_row();

                    ui.label("f(x) =");
                    ui.add(
                        TextEdit::singleline(&mut form.function)
                            .code_editor()
                            .desired_width(f32::INFINITY),
                    );
                    ui.end_row();
                });

            ui.add_space(4.0);
            ui.label(RichText::new(USAGE).small().weak());
            ui.add_space(8.0);
            if ui.button("Execute").clicked() {
                execute = true;
            }
        });

    state.show_fit_window = open;
    if let Some(file) = file_change {
        state.set_fit_file(file);
    }
    if use_range {
        state.use_visible_range();
    }
    if execute {
        state.run_fit();
    }
}
