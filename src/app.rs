use eframe::egui;

use crate::state::AppState;
use crate::ui::{console_window, dialogs, fit_window, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct HysteresisApp {
    pub state: AppState,
}

impl eframe::App for HysteresisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Files dropped onto the window ----
        let dropped: Vec<_> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        for path in dropped {
            self.state.load_path(&path);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: pairs and transforms ----
        egui::SidePanel::left("pair_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::hysteresis_plot(ui, &mut self.state);
        });

        // ---- Floating windows ----
        dialogs::transform_window(ctx, &mut self.state);
        dialogs::style_window(ctx, &mut self.state);
        fit_window::fit_window(ctx, &mut self.state);
        console_window::console_window(ctx, &mut self.state);
        dialogs::notice_window(ctx, &mut self.state);
    }
}
