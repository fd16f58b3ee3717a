// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

//! SVG document writer.

use super::approximate_text_width;
use crate::surface::{Color, DrawSurface, Point, Stroke, TextAlign, TransformStack};
use anyhow::Context;
use std::fmt::Write;
use std::fs;
use std::path::Path;

const FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    body: String,
    transform: TransformStack,
    width: f32,
    height: f32,
    visible: bool,
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn paint_attr(name: &str, color: Color) -> String {
    if color.a == 255 {
        format!(r#"{name}="{}""#, color.to_hex())
    } else {
        format!(r#"{name}="{}" {name}-opacity="{:.3}""#, color.to_hex(), color.alpha())
    }
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The complete document for what has been drawn so far.
    pub fn finish(&self) -> String {
        let mut svg = format!(
            "{}\n",
            format_args!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.2} {h:.2}"{hidden}>"#,
                w = self.width,
                h = self.height,
                hidden = if self.visible { "" } else { r#" visibility="hidden""# },
            )
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.finish()).with_context(|| format!("writing {}", path.display()))
    }
}

impl DrawSurface for SvgSurface {
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.width = (width * pixel_ratio).max(0.0);
        self.height = (height * pixel_ratio).max(0.0);
        self.transform.reset(pixel_ratio);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn clear(&mut self, width: f32, height: f32) -> anyhow::Result<()> {
        let min = self.transform.apply(Point::ORIGIN);
        let w = self.transform.apply_length(width);
        let h = self.transform.apply_length(height);
        if min.x <= 0.0 && min.y <= 0.0 && min.x + w >= self.width && min.y + h >= self.height {
            self.body.clear();
            return Ok(());
        }
        // Partial clear: paint the region over with the page background.
        writeln!(
            self.body,
            r##"  <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="#ffffff"/>"##,
            min.x, min.y, w, h
        )?;
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
        let c = self.transform.apply(center);
        let r = self.transform.apply_length(radius);
        let fill = fill.map_or_else(|| r#"fill="none""#.to_string(), |color| paint_attr("fill", color));
        let stroke = match stroke {
            Some(s) => format!(
                r#"{} stroke-width="{:.2}""#,
                paint_attr("stroke", s.color),
                self.transform.apply_length(s.width)
            ),
            None => r#"stroke="none""#.to_string(),
        };
        writeln!(
            self.body,
            r#"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" {} {}/>"#,
            c.x, c.y, r, fill, stroke
        )?;
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
        let min = self.transform.apply(Point::new(x, y));
        writeln!(
            self.body,
            r#"  <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {}/>"#,
            min.x,
            min.y,
            self.transform.apply_length(width),
            self.transform.apply_length(height),
            paint_attr("fill", color)
        )?;
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
        let p = self.transform.apply(at);
        let anchor = match align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        writeln!(
            self.body,
            r#"  <text x="{:.2}" y="{:.2}" text-anchor="{}" font-family="{}" font-size="{:.2}" {}>{}</text>"#,
            p.x,
            p.y,
            anchor,
            FONT_FAMILY,
            self.transform.apply_length(font_size),
            paint_attr("fill", color),
            escape_xml(text)
        )?;
        Ok(())
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        approximate_text_width(text, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_scaled_elements() {
        let mut svg = SvgSurface::new();
        svg.resize(200.0, 100.0, 2.0);
        svg.set_visible(true);
        svg.save();
        svg.translate(10.0, 10.0);
        svg.circle(Point::ORIGIN, 5.0, Some(Color::WHITE), Some(Stroke::new(1.0, Color::BLACK)))
            .unwrap();
        svg.restore();
        let doc = svg.finish();
        assert_eq!(
            doc.lines().next(),
            Some(r#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="200" viewBox="0 0 400.00 200.00">"#)
        );
        assert!(doc.contains(r##"<circle cx="20.00" cy="20.00" r="10.00" fill="#ffffff" stroke="#000000" stroke-width="2.00"/>"##));
        assert!(doc.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn escapes_text_and_writes_opacity() {
        let mut svg = SvgSurface::new();
        svg.resize(50.0, 50.0, 1.0);
        svg.fill_text("R<B & co", Point::new(1.0, 2.0), TextAlign::Right, 12.0, Color::BLACK.with_alpha(0.5))
            .unwrap();
        let doc = svg.finish();
        assert!(doc.contains("R&lt;B &amp; co"));
        assert!(doc.contains(r#"text-anchor="end""#));
        assert!(doc.contains(r#"fill-opacity="0.502""#));
        assert!(doc.contains(r#"visibility="hidden""#));
    }

    #[test]
    fn full_clear_drops_previous_elements() {
        let mut svg = SvgSurface::new();
        svg.resize(50.0, 50.0, 1.0);
        svg.fill_rect(0.0, 0.0, 5.0, 5.0, Color::BLACK).unwrap();
        svg.clear(50.0, 50.0).unwrap();
        assert!(!svg.finish().contains("<rect"));
    }
}
