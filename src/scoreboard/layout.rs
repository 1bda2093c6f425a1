//! Scaling arithmetic for the overlay.
//!
//! The design surface is 896x512; every dimension is expressed on that
//! surface and multiplied by a single uniform scale so the overlay keeps its
//! proportions in any container.

use serde::Serialize;

use super::ScoreboardView;

pub const BASE_WIDTH: f64 = 896.0;
pub const BASE_HEIGHT: f64 = 512.0;

const NAME_BASE_FONT: f64 = 80.0;
/// Rough glyph width as a fraction of the font size
const CHAR_WIDTH_RATIO: f64 = 0.6;
const SCORE_BASE_FONT: f64 = 100.0;

/// Pixel sizes for one render of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreboardLayout {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    /// Shared by both names so they line up; sized by the longer one
    pub name_font_px: f64,
    /// Current-game points box
    pub points_font_px: f64,
    pub set_font_px: f64,
    pub set_cell_width_px: f64,
    pub serving_arrow_px: f64,
    pub header_height_px: f64,
    pub name_row_height_px: f64,
    pub border_px: f64,
    pub venue_logo_px: (f64, f64),
    pub event_logo_px: (f64, f64),
    pub tournament_logo_width_px: f64,
}

impl ScoreboardLayout {
    /// Lay out `view` in a `width` x `height` container. Non-positive or
    /// non-finite dimensions fall back to the base surface.
    pub fn compute(width: f64, height: f64, view: &ScoreboardView) -> Self {
        let width = sanitize(width, BASE_WIDTH);
        let height = sanitize(height, BASE_HEIGHT);
        let scale = (width / BASE_WIDTH).min(height / BASE_HEIGHT);

        ScoreboardLayout {
            width,
            height,
            scale,
            name_font_px: name_font_px(width, scale, &view.player1, &view.player2),
            points_font_px: points_font_px(width, height),
            set_font_px: 100.0 * scale,
            set_cell_width_px: 80.0 * scale,
            serving_arrow_px: 50.0 * scale,
            header_height_px: 62.5 * scale,
            name_row_height_px: 80.0 * scale,
            border_px: 5.0 * scale,
            venue_logo_px: (220.0 * scale, 30.0 * scale),
            event_logo_px: (195.0 * scale, 20.0 * scale),
            tournament_logo_width_px: 395.0 * scale,
        }
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn name_font_px(width: f64, scale: f64, player1: &str, player2: &str) -> f64 {
    let longest = player1.chars().count().max(player2.chars().count());
    if longest == 0 {
        return NAME_BASE_FONT * scale;
    }
    let max_width = width * 0.8;
    let name_width = longest as f64 * NAME_BASE_FONT * CHAR_WIDTH_RATIO;
    NAME_BASE_FONT * scale * (max_width / name_width).min(1.0)
}

fn points_font_px(width: f64, height: f64) -> f64 {
    let box_height = height * 0.16;
    let box_width = width * 0.11;
    let fit = (box_height / SCORE_BASE_FONT).min(box_width / SCORE_BASE_FONT);
    // 20% padding inside the box
    SCORE_BASE_FONT * fit * 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn view(p1: &str, p2: &str) -> ScoreboardView {
        ScoreboardView {
            player1: p1.into(),
            player2: p2.into(),
            ..ScoreboardView::placeholder()
        }
    }

    #[test]
    fn test_base_surface_scale_is_one() {
        let layout = ScoreboardLayout::compute(BASE_WIDTH, BASE_HEIGHT, &view("A", "B"));
        assert_relative_eq!(layout.scale, 1.0, epsilon = 1e-9);
        assert_relative_eq!(layout.serving_arrow_px, 50.0, epsilon = 1e-9);
        assert_relative_eq!(layout.header_height_px, 62.5, epsilon = 1e-9);
    }

    #[test]
    fn test_scale_uses_tighter_axis() {
        // 1920x1080: width ratio 2.142..., height ratio 2.109375
        let layout = ScoreboardLayout::compute(1920.0, 1080.0, &view("A", "B"));
        assert_relative_eq!(layout.scale, 1080.0 / 512.0, epsilon = 1e-9);

        let layout = ScoreboardLayout::compute(448.0, 1000.0, &view("A", "B"));
        assert_relative_eq!(layout.scale, 0.5, epsilon = 1e-9);
        assert_relative_eq!(layout.border_px, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_short_names_use_full_font() {
        let layout = ScoreboardLayout::compute(896.0, 512.0, &view("R. NADAL", "N. DJOKOVIC"));
        // 11 chars * 48px = 528px < 716.8px available
        assert_relative_eq!(layout.name_font_px, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_long_name_shrinks_both() {
        let long = "A".repeat(20);
        let layout = ScoreboardLayout::compute(896.0, 512.0, &view(&long, "B"));
        // 20 * 48 = 960px wide, 716.8px available
        assert_relative_eq!(layout.name_font_px, 80.0 * 716.8 / 960.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_names_do_not_divide_by_zero() {
        let layout = ScoreboardLayout::compute(896.0, 512.0, &view("", ""));
        assert_relative_eq!(layout.name_font_px, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_points_font_fits_box() {
        // box 81.92 x 98.56 -> limited by height: 0.8192 * 0.8 * 100
        let layout = ScoreboardLayout::compute(896.0, 512.0, &view("A", "B"));
        assert_relative_eq!(layout.points_font_px, 65.536, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_dimensions_fall_back() {
        let layout = ScoreboardLayout::compute(0.0, f64::NAN, &view("A", "B"));
        assert_relative_eq!(layout.width, BASE_WIDTH, epsilon = 1e-9);
        assert_relative_eq!(layout.height, BASE_HEIGHT, epsilon = 1e-9);
        assert_relative_eq!(layout.scale, 1.0, epsilon = 1e-9);
    }
}
