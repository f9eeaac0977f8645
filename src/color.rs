use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Cycle palette
// ---------------------------------------------------------------------------

/// Colour at `t ∈ [0, 1]` on a jet-like sweep from blue to red.
pub fn jet(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let hue = 240.0 * (1.0 - t);
    let hsl = Hsl::new(hue, 0.85, 0.45);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` colours evenly spaced along [`jet`].
pub fn generate_palette(n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![jet(0.0)],
        _ => (0..n).map(|i| jet(i as f32 / (n - 1) as f32)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Named colours for the style dialog
// ---------------------------------------------------------------------------

/// Colours offered when customizing a cycle.
pub const STYLE_COLORS: [&str; 6] = ["blue", "red", "green", "black", "orange", "purple"];

/// Look up an SVG/CSS colour name (`"orange"`).
pub fn named_color(name: &str) -> Option<Color32> {
    palette::named::from_str(name).map(|c| Color32::from_rgb(c.red, c.green, c.blue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_runs_from_blue_to_red() {
        let colors = generate_palette(3);
        assert_eq!(colors.len(), 3);
        assert!(colors[0].b() > colors[0].r());
        assert!(colors[2].r() > colors[2].b());
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn style_colors_are_known_names() {
        for name in STYLE_COLORS {
            assert!(named_color(name).is_some(), "{name}");
        }
        assert_eq!(named_color("black"), Some(Color32::BLACK));
        assert_eq!(named_color("no-such-colour"), None);
    }
}
