// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Paints onto a region of an `egui::Painter`.
//!
//! egui works in points and maps them to physical pixels itself, so the pixel
//! ratio handed to `resize` is not applied to the transform.

use crate::surface::{Color, DrawSurface, Point, Stroke, TextAlign, TransformStack};

#[inline]
fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

#[inline]
fn to_stroke(stroke: Option<Stroke>, scale: f32) -> egui::Stroke {
    match stroke {
        Some(s) => egui::Stroke::new(s.width * scale, to_color32(s.color)),
        None => egui::Stroke::NONE,
    }
}

pub struct EguiSurface {
    painter: egui::Painter,
    origin: egui::Pos2,
    transform: TransformStack,
}

impl EguiSurface {
    /// A surface whose local origin is the top-left corner of `rect`.
    pub fn new(painter: egui::Painter, rect: egui::Rect) -> Self {
        Self {
            painter: painter.with_clip_rect(rect),
            origin: rect.min,
            transform: TransformStack::default(),
        }
    }

    fn to_screen(&self, p: Point) -> egui::Pos2 {
        let p = self.transform.apply(p);
        egui::pos2(self.origin.x + p.x, self.origin.y + p.y)
    }
}

impl DrawSurface for EguiSurface {
    fn resize(&mut self, _width: f32, _height: f32, _pixel_ratio: f32) {
        self.transform.reset(1.0);
    }

    fn clear(&mut self, width: f32, height: f32) -> anyhow::Result<()> {
        let min = self.to_screen(Point::ORIGIN);
        let size = egui::vec2(
            self.transform.apply_length(width),
            self.transform.apply_length(height),
        );
        self.painter
            .rect_filled(egui::Rect::from_min_size(min, size), 0.0, egui::Color32::WHITE);
        Ok(())
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
        let scale = self.transform.scale();
        self.painter.circle(
            self.to_screen(center),
            radius * scale,
            fill.map_or(egui::Color32::TRANSPARENT, to_color32),
            to_stroke(stroke, scale),
        );
        Ok(())
    }

    fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    ) -> anyhow::Result<()> {
        let min = self.to_screen(Point::new(x, y));
        let size = egui::vec2(
            self.transform.apply_length(width),
            self.transform.apply_length(height),
        );
        self.painter
            .rect_filled(egui::Rect::from_min_size(min, size), 0.0, to_color32(color));
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &str,
        at: Point,
        align: TextAlign,
        font_size: f32,
        color: Color,
    ) -> anyhow::Result<()> {
        // Canvas text sits on its baseline; the bottom anchor is the closest egui offers.
        let anchor = match align {
            TextAlign::Left => egui::Align2::LEFT_BOTTOM,
            TextAlign::Center => egui::Align2::CENTER_BOTTOM,
            TextAlign::Right => egui::Align2::RIGHT_BOTTOM,
        };
        self.painter.text(
            self.to_screen(at),
            anchor,
            text,
            egui::FontId::proportional(self.transform.apply_length(font_size)),
            to_color32(color),
        );
        Ok(())
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        let galley = self.painter.layout_no_wrap(
            text.to_owned(),
            egui::FontId::proportional(font_size),
            egui::Color32::BLACK,
        );
        galley.size().x
    }
}
