// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Surface that records every draw call in device-pixel coordinates.

use super::approximate_text_width;
use crate::surface::{Color, DrawSurface, Point, Stroke, TextAlign, TransformStack};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        center: Point,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Text {
        text: String,
        at: Point,
        align: TextAlign,
        font_size: f32,
        color: Color,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    transform: TransformStack,
    backing_size: (u32, u32),
    visible: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Backing store size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        self.backing_size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.commands)?)
    }

    fn record(&mut self, command: DrawCommand) -> anyhow::Result<()> {
        self.commands.push(command);
        Ok(())
    }
}

impl DrawSurface for RecordingSurface {
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.backing_size = (
            (width * pixel_ratio).max(0.0).round() as u32,
            (height * pixel_ratio).max(0.0).round() as u32,
        );
        self.transform.reset(pixel_ratio);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn clear(&mut self, width: f32, height: f32) -> anyhow::Result<()> {
        let origin = self.transform.apply(Point::ORIGIN);
        self.commands.clear();
        self.record(DrawCommand::Clear {
            x: origin.x,
            y: origin.y,
            width: self.transform.apply_length(width),
            height: self.transform.apply_length(height),
        })
    }

    fn save(&mut self) {
        self.transform.save();
    }

    fn restore(&mut self) {
        self.transform.restore();
    }

    fn depth(&self) -> usize {
        self.transform.depth()
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.transform.translate(dx, dy);
    }

    fn circle(
        &mut self,
        center: Point,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> anyhow::Result<()> {
        let center = self.transform.apply(center);
        let radius = self.transform.apply_length(radius);
        let stroke = stroke.map(|s| Stroke::new(self.transform.apply_length(s.width), s.color));
        self.record(DrawCommand::Circle {
            center,
            radius,
            fill,
            stroke,
        })
    }

    fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    ) -> anyhow::Result<()> {
        let min = self.transform.apply(Point::new(x, y));
        self.record(DrawCommand::Rect {
            x: min.x,
            y: min.y,
            width: self.transform.apply_length(width),
            height: self.transform.apply_length(height),
            color,
        })
    }

    fn fill_text(
        &mut self,
        text: &str,
        at: Point,
        align: TextAlign,
        font_size: f32,
        color: Color,
    ) -> anyhow::Result<()> {
        let at = self.transform.apply(at);
        self.record(DrawCommand::Text {
            text: text.to_string(),
            at,
            align,
            font_size: self.transform.apply_length(font_size),
            color,
        })
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        approximate_text_width(text, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_translated_and_scaled_coordinates() {
        let mut surface = RecordingSurface::new();
        surface.resize(100.0, 50.0, 2.0);
        assert_eq!(surface.backing_size(), (200, 100));

        surface.save();
        surface.translate(10.0, 20.0);
        surface
            .circle(Point::new(1.0, 2.0), 3.0, Some(Color::WHITE), None)
            .unwrap();
        surface.restore();
        surface.fill_rect(1.0, 1.0, 4.0, 5.0, Color::BLACK).unwrap();

        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::Circle {
                    center: Point::new(22.0, 44.0),
                    radius: 6.0,
                    fill: Some(Color::WHITE),
                    stroke: None,
                },
                DrawCommand::Rect {
                    x: 2.0,
                    y: 2.0,
                    width: 8.0,
                    height: 10.0,
                    color: Color::BLACK,
                },
            ]
        );
    }

    #[test]
    fn clear_discards_previous_frame() {
        let mut surface = RecordingSurface::new();
        surface.resize(10.0, 10.0, 1.0);
        surface.fill_text("a", Point::ORIGIN, TextAlign::Left, 12.0, Color::BLACK).unwrap();
        surface.clear(10.0, 10.0).unwrap();
        assert_eq!(surface.commands().len(), 1);
        assert!(surface.texts().is_empty());
    }

    #[test]
    fn commands_serialize_with_op_tag() {
        let mut surface = RecordingSurface::new();
        surface.resize(10.0, 10.0, 1.0);
        surface.clear(10.0, 10.0).unwrap();
        let json = surface.to_json().unwrap();
        assert!(json.contains(r#""op": "clear""#));
    }
}
