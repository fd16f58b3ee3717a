// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! Stateful, canvas-like drawing surface and the viewport it is fitted to.
//!
//! Coordinates passed to a [`DrawSurface`] are in the current local space:
//! logical units after `resize`, shifted by every `translate` since the last
//! matching `save`. Backends resolve them through a [`TransformStack`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[inline]
fn unit_component(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::from_rgb(255, 255, 255);
    pub const BLACK: Color = Color::from_rgb(0, 0, 0);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn from_rgb_array(rgb: [u8; 3]) -> Self {
        Self::from_rgb(rgb[0], rgb[1], rgb[2])
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: unit_component(alpha),
            ..self
        }
    }

    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// Horizontal anchoring of text relative to its position; the vertical
/// position is always the text baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

pub trait DrawSurface {
    /// Fits the backing store to `width x height` logical units at
    /// `pixel_ratio` device pixels per unit. Resets the transform to identity
    /// and then scales it by the ratio; the save stack is discarded.
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32);

    fn set_visible(&mut self, _visible: bool) {}

    fn clear(&mut self, width: f32, height: f32) -> anyhow::Result<()>;

    fn save(&mut self);
    fn restore(&mut self);
    /// Number of unmatched `save` calls.
    fn depth(&self) -> usize;
    fn translate(&mut self, dx: f32, dy: f32);

    fn circle(
        &mut self,
        center: Point,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> anyhow::Result<()>;

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color)
        -> anyhow::Result<()>;

    fn fill_text(
        &mut self,
        text: &str,
        at: Point,
        align: TextAlign,
        font_size: f32,
        color: Color,
    ) -> anyhow::Result<()>;

    /// Advance width of `text` in local units.
    fn measure_text(&self, text: &str, font_size: f32) -> f32;

    /// Pops saved states until `depth` unmatched saves remain.
    fn restore_to(&mut self, depth: usize) {
        while self.depth() > depth {
            self.restore();
        }
    }
}

/// Source of the logical size and device pixel ratio a surface is fitted to.
pub trait ViewportProvider {
    fn size(&self) -> (f32, f32);

    fn pixel_ratio(&self) -> f32 {
        1.0
    }
}

/// A viewport with fixed dimensions, for headless rendering and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl FixedViewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }
}

impl ViewportProvider for FixedViewport {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    dx: f32,
    dy: f32,
    scale: f32,
}

impl Transform {
    const IDENTITY: Transform = Transform {
        dx: 0.0,
        dy: 0.0,
        scale: 1.0,
    };
}

/// Translate-and-uniform-scale transform with a save stack.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Transform,
    saved: Vec<Transform>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self {
            current: Transform::IDENTITY,
            saved: Vec::new(),
        }
    }
}

impl TransformStack {
    /// Identity, then scaled by `scale`.
    pub fn reset(&mut self, scale: f32) {
        self.saved.clear();
        self.current = Transform::IDENTITY;
        self.current.scale = scale;
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    pub fn restore(&mut self) {
        if let Some(previous) = self.saved.pop() {
            self.current = previous;
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.current.dx += dx * self.current.scale;
        self.current.dy += dy * self.current.scale;
    }

    pub fn scale(&self) -> f32 {
        self.current.scale
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x * self.current.scale + self.current.dx,
            p.y * self.current.scale + self.current.dy,
        )
    }

    pub fn apply_length(&self, length: f32) -> f32 {
        length * self.current.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_accumulates_and_restore_rewinds() {
        let mut t = TransformStack::default();
        t.reset(2.0);
        t.save();
        t.translate(10.0, 5.0);
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(22.0, 12.0));
        assert_eq!(t.apply_length(3.0), 6.0);
        t.restore();
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(2.0, 2.0));
        assert_eq!(t.depth(), 0);
    }

    #[test]
    fn restore_on_empty_stack_is_noop() {
        let mut t = TransformStack::default();
        t.translate(4.0, 4.0);
        t.restore();
        assert_eq!(t.apply(Point::ORIGIN), Point::new(4.0, 4.0));
    }

    #[test]
    fn colours_format_as_hex() {
        assert_eq!(Color::from_rgb(0xe9, 0x1e, 0x63).to_hex(), "#e91e63");
        assert_eq!(Color::WHITE.with_alpha(0.2).a, 51);
    }
}
