// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Per-club statistics block: ratio and member labels over a two-colour bar.

use crate::model::TraitCounts;
use crate::style::DrawStyle;
use crate::surface::{Color, DrawSurface, Point, TextAlign};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSegments {
    pub r_width: f32,
    pub b_width: f32,
}

/// Widths of the R and B segments of a `bar_width` bar. The B segment takes
/// the remainder so the two always add up to the full bar. `None` for an
/// empty club.
pub fn bar_segments(counts: TraitCounts, bar_width: f32) -> Option<BarSegments> {
    let total = counts.total();
    if total == 0 {
        return None;
    }
    let r_width = counts.r as f32 / total as f32 * bar_width;
    Some(BarSegments {
        r_width,
        b_width: bar_width - r_width,
    })
}

/// `"R/B: 3.00"`; `"R/B: N/A"` when the club is empty or has no B members.
/// Halves round up: 1/8 reads `0.13`.
pub fn ratio_label(counts: TraitCounts) -> String {
    if counts.total() == 0 || counts.b == 0 {
        return "R/B: N/A".to_string();
    }
    let hundredths = (counts.r * 200 + counts.b) / (counts.b * 2);
    format!("R/B: {}.{:02}", hundredths / 100, hundredths % 100)
}

pub fn members_label(counts: TraitCounts) -> String {
    format!("Members: {}", counts.total())
}

/// Draws the stats block centred on `x`, with the bar's top edge at `y`.
pub fn draw_club_stats(
    surface: &mut dyn DrawSurface,
    style: &DrawStyle,
    x: f32,
    y: f32,
    counts: TraitCounts,
) -> anyhow::Result<()> {
    let bar_x = x - style.bar_width / 2.0;
    let spacing = style.stats_spacing;

    draw_info_label(surface, style, &ratio_label(counts), x, y - spacing * 1.2, style.bar_height)?;
    draw_info_label(surface, style, &members_label(counts), x, y - spacing * 0.6, style.bar_height)?;

    surface.fill_rect(bar_x, y, style.bar_width, style.bar_height, style.bar_background)?;

    if let Some(segments) = bar_segments(counts, style.bar_width) {
        surface.fill_rect(bar_x, y, segments.r_width, style.bar_height, style.r_color)?;
        surface.fill_rect(
            bar_x + segments.r_width,
            y,
            segments.b_width,
            style.bar_height,
            style.b_color,
        )?;
    }

    draw_count_label(
        surface,
        style,
        counts.r,
        bar_x - style.count_padding,
        y,
        style.r_color,
        TextAlign::Right,
    )?;
    draw_count_label(
        surface,
        style,
        counts.b,
        bar_x + style.bar_width + style.count_padding,
        y,
        style.b_color,
        TextAlign::Left,
    )
}

fn draw_info_label(
    surface: &mut dyn DrawSurface,
    style: &DrawStyle,
    text: &str,
    x: f32,
    y: f32,
    height: f32,
) -> anyhow::Result<()> {
    let width = surface.measure_text(text, style.font_size);
    let padding = height * 0.3;

    surface.fill_rect(
        x - width / 2.0 - padding,
        y - height / 2.0,
        width + padding * 2.0,
        height,
        style.label_backing,
    )?;
    surface.fill_text(
        text,
        Point::new(x, y + height / 3.0),
        TextAlign::Center,
        style.font_size,
        style.text_color,
    )
}

// Count next to one end of the bar; `x` is the text anchor, the backing box
// extends away from the bar.
fn draw_count_label(
    surface: &mut dyn DrawSurface,
    style: &DrawStyle,
    count: usize,
    x: f32,
    y: f32,
    color: Color,
    align: TextAlign,
) -> anyhow::Result<()> {
    let text = count.to_string();
    let height = style.count_height;
    let width = surface.measure_text(&text, style.font_size);
    let padding = height * 0.3;

    let box_x = match align {
        TextAlign::Right => x - width - padding * 2.0,
        _ => x,
    };
    surface.fill_rect(box_x, y, width + padding * 2.0, height, style.label_backing)?;
    surface.fill_text(
        &text,
        Point::new(x, y + height / 2.0 + height / 3.0),
        align,
        style.font_size,
        color,
    )
}
