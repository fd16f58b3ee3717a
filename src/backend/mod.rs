// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

pub mod egui_painter;
pub mod recording;
pub mod svg;

pub use egui_painter::EguiSurface;
pub use recording::{DrawCommand, RecordingSurface};
pub use svg::SvgSurface;

// Average advance of a proportional sans-serif glyph, in ems. Used by the
// backends that have no font engine.
const APPROX_GLYPH_ADVANCE: f32 = 0.56;

pub(crate) fn approximate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * APPROX_GLYPH_ADVANCE
}
