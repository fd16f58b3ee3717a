// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

use crate::layout::GridLayout;
use crate::model::Trait;
use crate::settings::VisualizerSettings;
use crate::surface::{Color, Stroke};

/// Sizes and colours resolved for one layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub club_radius: f32,
    pub club_fill: Color,
    pub club_stroke: Stroke,
    pub text_color: Color,
    pub font_size: f32,
    pub label_offset: f32,
    pub label_backing: Color,
    pub stats_spacing: f32,
    pub bar_width: f32,
    pub bar_height: f32,
    pub bar_background: Color,
    pub count_padding: f32,
    pub count_height: f32,
    pub dot_radius: f32,
    pub dot_outline: Stroke,
    pub r_color: Color,
    pub b_color: Color,
    pub highlight: Color,
}

impl DrawStyle {
    pub fn new(layout: &GridLayout, settings: &VisualizerSettings) -> Self {
        let radius = layout.club_radius;
        let min_dim = layout.min_dimension();
        Self {
            club_radius: radius,
            club_fill: Color::from_rgb_array(settings.club_fill_color),
            club_stroke: Stroke::new(
                min_dim * settings.club_stroke_fraction,
                Color::from_rgb_array(settings.club_stroke_color),
            ),
            text_color: Color::from_rgb_array(settings.text_color),
            font_size: settings.min_font_size.max((min_dim * settings.font_fraction).floor()),
            label_offset: radius * settings.label_offset_fraction,
            label_backing: settings.label_backing(),
            stats_spacing: radius * settings.stats_spacing_fraction,
            bar_width: radius * settings.bar_width_fraction,
            bar_height: radius * settings.bar_height_fraction,
            bar_background: Color::from_rgb_array(settings.bar_background_color),
            count_padding: min_dim * settings.count_padding_fraction,
            count_height: min_dim * settings.count_height_fraction,
            dot_radius: min_dim * settings.dot_radius_fraction,
            dot_outline: Stroke::new(min_dim * settings.dot_outline_fraction, Color::WHITE),
            r_color: settings.r_color(),
            b_color: settings.b_color(),
            highlight: Color::from_rgb_array(settings.highlight_color),
        }
    }

    pub fn trait_color(&self, kind: Trait) -> Color {
        match kind {
            Trait::R => self.r_color,
            Trait::B => self.b_color,
        }
    }
}
