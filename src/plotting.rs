use std::collections::BTreeMap;

use eframe::egui::Color32;
use egui_plot::{LineStyle, MarkerShape};

use crate::color::generate_palette;
use crate::data::model::{LoadedFile, ResolvedPair, file_label};
use crate::data::processing::ProcessingError;

// ---------------------------------------------------------------------------
// Cycle styles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Diamond,
    Star,
    Cross,
}

impl Marker {
    pub const ALL: [Marker; 6] = [
        Marker::Circle,
        Marker::Square,
        Marker::Triangle,
        Marker::Diamond,
        Marker::Star,
        Marker::Cross,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Marker::Circle => "o",
            Marker::Square => "s",
            Marker::Triangle => "^",
            Marker::Diamond => "d",
            Marker::Star => "*",
            Marker::Cross => "x",
        }
    }

    pub fn shape(self) -> MarkerShape {
        match self {
            Marker::Circle => MarkerShape::Circle,
            Marker::Square => MarkerShape::Square,
            Marker::Triangle => MarkerShape::Up,
            Marker::Diamond => MarkerShape::Diamond,
            Marker::Star => MarkerShape::Asterisk,
            Marker::Cross => MarkerShape::Cross,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Solid,
    Dashed,
    DashDot,
    Dotted,
}

impl LineKind {
    pub const ALL: [LineKind; 4] = [
        LineKind::Solid,
        LineKind::Dashed,
        LineKind::DashDot,
        LineKind::Dotted,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            LineKind::Solid => "-",
            LineKind::Dashed => "--",
            LineKind::DashDot => "-.",
            LineKind::Dotted => ":",
        }
    }

    /// egui_plot has no dash-dot pattern; short dashes stand in for it.
    pub fn style(self) -> LineStyle {
        match self {
            LineKind::Solid => LineStyle::Solid,
            LineKind::Dashed => LineStyle::Dashed { length: 10.0 },
            LineKind::DashDot => LineStyle::Dashed { length: 4.0 },
            LineKind::Dotted => LineStyle::Dotted { spacing: 5.0 },
        }
    }
}

/// Colour, marker and line style shared by both branches of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStyle {
    pub color: Color32,
    pub marker: Marker,
    pub line: LineKind,
}

/// Saved styles, by cycle index.  Kept for the lifetime of the process.
pub type PlotCustomizations = BTreeMap<usize, CycleStyle>;

// ---------------------------------------------------------------------------
// Plot model
// ---------------------------------------------------------------------------

/// One branch of a cycle as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// Legend label, shared by both branches of a cycle.
    pub name: String,
    pub cycle: usize,
    pub points: Vec<[f64; 2]>,
    pub style: CycleStyle,
}

/// A dashed model curve drawn over the data (fit or initial guess).
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub color: Color32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotModel {
    pub curves: Vec<Curve>,
    pub overlays: Vec<Overlay>,
}

impl PlotModel {
    pub fn n_cycles(&self) -> usize {
        self.curves.iter().map(|c| c.cycle + 1).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Restyle every branch of `cycle`.
    pub fn restyle(&mut self, cycle: usize, style: CycleStyle) {
        for curve in self.curves.iter_mut().filter(|c| c.cycle == cycle) {
            curve.style = style;
        }
    }
}

pub fn cycle_label(cycle: usize) -> String {
    format!("Cycle {}", cycle + 1)
}

/// Build the curves for the selected pairs.  Saved customizations override
/// the default jet colours and circle markers cycle by cycle.
pub fn build_plot(
    files: &[LoadedFile],
    pairs: &[ResolvedPair],
    customizations: &PlotCustomizations,
) -> Result<PlotModel, ProcessingError> {
    let palette = generate_palette(pairs.len());
    let mut curves = Vec::with_capacity(pairs.len());

    for (i, pair) in pairs.iter().enumerate() {
        let table = &files
            .get(pair.file)
            .ok_or_else(|| ProcessingError::MissingFile {
                file: file_label(pair.file),
            })?
            .table;
        let missing = |column: &str| ProcessingError::MissingColumn {
            file: file_label(pair.file),
            column: column.to_string(),
        };
        let x = table.column(&pair.x).ok_or_else(|| missing(&pair.x))?;
        let y = table.column(&pair.y).ok_or_else(|| missing(&pair.y))?;
        log::info!("Plot of {} vs {}", pair.x, pair.y);

        let cycle = i / 2;
        let style = customizations.get(&cycle).copied().unwrap_or(CycleStyle {
            color: palette[cycle * 2],
            marker: Marker::Circle,
            line: LineKind::Solid,
        });
        let points = x
            .iter()
            .zip(y)
            .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
            .map(|(&xi, &yi)| [xi, yi])
            .collect();

        curves.push(Curve {
            name: cycle_label(cycle),
            cycle,
            points,
            style,
        });
    }

    Ok(PlotModel {
        curves,
        overlays: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::processing::tests::{loop_pairs, open_loop_file};

    #[test]
    fn two_pairs_make_one_cycle() {
        let files = vec![open_loop_file()];
        let model = build_plot(&files, &loop_pairs(), &PlotCustomizations::new()).unwrap();
        assert_eq!(model.curves.len(), 2);
        assert_eq!(model.n_cycles(), 1);
        assert!(model.curves.iter().all(|c| c.name == "Cycle 1"));
        assert_eq!(model.curves[0].style, model.curves[1].style);
        assert_eq!(model.curves[0].points.len(), 200);
    }

    #[test]
    fn customizations_override_defaults() {
        let files = vec![open_loop_file()];
        let style = CycleStyle {
            color: Color32::RED,
            marker: Marker::Cross,
            line: LineKind::Dotted,
        };
        let customizations = PlotCustomizations::from([(0, style)]);
        let model = build_plot(&files, &loop_pairs(), &customizations).unwrap();
        assert!(model.curves.iter().all(|c| c.style == style));
    }

    #[test]
    fn restyle_touches_only_one_cycle() {
        let files = vec![open_loop_file()];
        let mut pairs = loop_pairs();
        pairs.extend(loop_pairs());
        let mut model = build_plot(&files, &pairs, &PlotCustomizations::new()).unwrap();
        assert_eq!(model.n_cycles(), 2);
        let style = CycleStyle {
            color: Color32::BLACK,
            marker: Marker::Square,
            line: LineKind::Dashed,
        };
        model.restyle(1, style);
        assert_ne!(model.curves[0].style, style);
        assert_eq!(model.curves[3].style, style);
    }

    #[test]
    fn style_symbols_match_their_menus() {
        let markers: Vec<&str> = Marker::ALL.iter().map(|m| m.symbol()).collect();
        assert_eq!(markers, ["o", "s", "^", "d", "*", "x"]);
        let lines: Vec<&str> = LineKind::ALL.iter().map(|l| l.symbol()).collect();
        assert_eq!(lines, ["-", "--", "-.", ":"]);
    }
}
