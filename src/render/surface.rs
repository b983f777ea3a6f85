//! Drawing surface and the display-list operations it records
//!
//! Renderers never talk to an output format directly. They issue draw calls
//! against a [`Surface`]; pages record them as [`DrawOp`]s which the writers
//! in [`crate::report`] later serialize. Coordinates are page units (mm) with
//! the origin at the top-left corner and y growing downwards.

use crate::severity::Rgb;
use serde::Serialize;
use std::sync::Arc;

/// Millimetres per typographic point; font sizes are given in points.
pub const MM_PER_PT: f64 = 0.3528;

/// Average glyph advance as a fraction of the font size for sans-serif text.
const AVG_GLYPH_WIDTH: f64 = 0.52;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Rgb, width: f64) -> Self {
        Self { color, width }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    /// Font size in points
    pub size: f64,
    pub color: Rgb,
    pub anchor: Anchor,
    pub bold: bool,
    /// Counter-clockwise rotation in degrees around the anchor point
    pub rotate: f64,
}

impl TextStyle {
    pub fn new(size: f64) -> Self {
        Self { size, color: Rgb(40, 40, 40), anchor: Anchor::Start, bold: false, rotate: 0.0 }
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn rotate(mut self, degrees: f64) -> Self {
        self.rotate = degrees;
        self
    }
}

/// Raster image embedded in a page (the branding logo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub mime: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
        /// Corner radius; 0 for square corners
        radius: f64,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<Point>,
        fill: Rgb,
        opacity: f64,
    },
    Text {
        at: Point,
        text: String,
        style: TextStyle,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: Arc<Image>,
    },
}

/// Anything the renderers can draw on.
///
/// Implementors only provide [`Surface::push`]; the shape helpers are
/// provided methods so every surface records identical geometry.
pub trait Surface {
    fn push(&mut self, op: DrawOp);

    fn fill_rect(&mut self, origin: Point, size: Size, fill: Rgb) {
        self.push(DrawOp::Rect {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            fill: Some(fill),
            stroke: None,
            radius: 0.0,
        });
    }

    fn stroke_rect(&mut self, origin: Point, size: Size, stroke: Stroke) {
        self.push(DrawOp::Rect {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            fill: None,
            stroke: Some(stroke),
            radius: 0.0,
        });
    }

    fn rounded_rect(&mut self, origin: Point, size: Size, fill: Rgb, radius: f64) {
        self.push(DrawOp::Rect {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            fill: Some(fill),
            stroke: None,
            radius,
        });
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.push(DrawOp::Line { from, to, stroke });
    }

    fn polyline(&mut self, points: Vec<Point>, stroke: Stroke) {
        if points.len() >= 2 {
            self.push(DrawOp::Polyline { points, stroke });
        }
    }

    fn polygon(&mut self, points: Vec<Point>, fill: Rgb, opacity: f64) {
        if points.len() >= 3 {
            self.push(DrawOp::Polygon { points, fill, opacity });
        }
    }

    fn text(&mut self, at: Point, text: &str, style: TextStyle) {
        self.push(DrawOp::Text { at, text: text.to_string(), style });
    }

    fn image(&mut self, origin: Point, size: Size, image: Arc<Image>) {
        self.push(DrawOp::Image {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            image,
        });
    }
}

/// A bare display list, used for rendering charts off-page (tests, previews).
impl Surface for Vec<DrawOp> {
    fn push(&mut self, op: DrawOp) {
        Vec::push(self, op);
    }
}

/// Approximate rendered width (mm) of `text` at `size` points.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * MM_PER_PT * AVG_GLYPH_WIDTH
}

/// Greedy word wrap to lines no wider than `max_width` mm.
///
/// Words longer than a full line are kept whole on their own line.
pub fn wrap_text(text: &str, max_width: f64, size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, size) <= max_width || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        lines.push(current);
    }
    lines
}

/// Height of one line of text at `size` points, with leading.
pub fn line_height(size: f64) -> f64 {
    size * MM_PER_PT * 1.45
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_surface_records_ops() {
        let mut ops: Vec<DrawOp> = Vec::new();
        ops.fill_rect(Point::new(1.0, 2.0), Size::new(3.0, 4.0), Rgb::WHITE);
        ops.text(Point::new(0.0, 0.0), "hello", TextStyle::new(9.0));
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], DrawOp::Rect { fill: Some(Rgb::WHITE), .. }));
        assert!(matches!(&ops[1], DrawOp::Text { text, .. } if text == "hello"));
    }

    #[test]
    fn test_degenerate_shapes_are_skipped() {
        let mut ops: Vec<DrawOp> = Vec::new();
        let stroke = Stroke::new(Rgb::BLACK, 0.2);
        ops.polyline(vec![Point::new(0.0, 0.0)], stroke);
        ops.polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], Rgb::BLACK, 0.5);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "Vibration levels are within acceptable limits for continued operation of this asset";
        let lines = wrap_text(text, 40.0, 9.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 9.0) <= 40.0 || !line.contains(' '), "line too wide: {}", line);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_keeps_paragraphs() {
        let lines = wrap_text("first\nsecond", 100.0, 9.0);
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_wrap_text_long_word_kept_whole() {
        let lines = wrap_text("supercalifragilistic", 5.0, 9.0);
        assert_eq!(lines, vec!["supercalifragilistic".to_string()]);
    }
}
