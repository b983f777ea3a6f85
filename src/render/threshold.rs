//! ISO 10816-3 vibration-severity reference grid
//!
//! Rows are the eight velocity bands (highest band on top), columns are the
//! machine groups, optionally split by foundation type. Cell colors come from
//! [`crate::severity::band_severity`]; nothing here depends on report data.

use super::surface::{Anchor, Point, Size, Stroke, Surface, TextStyle};
use crate::severity::{band_severity, Foundation, MachineGroup, Rgb, VELOCITY_BANDS};
use serde::{Deserialize, Serialize};

/// Width reserved right of the grid for the band labels
const BAND_LABEL_WIDTH: f64 = 12.0;
/// Height reserved under the grid for group labels (two text lines)
const GROUP_LABEL_HEIGHT: f64 = 14.0;
const LABEL_FONT: f64 = 7.0;
const GRID_STROKE: Stroke = Stroke { color: Rgb::WHITE, width: 0.4 };
const FRAME_STROKE: Stroke = Stroke { color: Rgb(90, 90, 90), width: 0.3 };
const LABEL_COLOR: Rgb = Rgb(60, 60, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdVariant {
    /// Four groups, each split rigid / flexible: 8 columns
    #[default]
    Full,
    /// One rigid-foundation column per group: 4 columns
    Compact,
}

impl ThresholdVariant {
    /// Grid columns left to right
    pub fn columns(self) -> Vec<(MachineGroup, Foundation)> {
        let foundations: &[Foundation] = match self {
            ThresholdVariant::Full => &[Foundation::Rigid, Foundation::Flexible],
            ThresholdVariant::Compact => &[Foundation::Rigid],
        };
        MachineGroup::ALL
            .iter()
            .flat_map(|&g| foundations.iter().map(move |&f| (g, f)))
            .collect()
    }
}

/// Draw the reference grid into the box at `origin` of `size`.
///
/// Label space is carved out of the box first; a box smaller than the label
/// space collapses the grid to zero size but still draws every label.
pub fn draw_threshold_chart(surface: &mut dyn Surface, origin: Point, size: Size, variant: ThresholdVariant) {
    let columns = variant.columns();
    let rows = VELOCITY_BANDS.len();

    let grid_w = (size.width - BAND_LABEL_WIDTH).max(0.0);
    let grid_h = (size.height - GROUP_LABEL_HEIGHT).max(0.0);
    let cell_w = grid_w / columns.len() as f64;
    let cell_h = grid_h / rows as f64;

    // Cells, top row is the highest band
    for (col, &(group, foundation)) in columns.iter().enumerate() {
        for row in 0..rows {
            let band = rows - 1 - row;
            let color = band_severity(group, foundation, band).color();
            let at = Point::new(origin.x + col as f64 * cell_w, origin.y + row as f64 * cell_h);
            surface.fill_rect(at, Size::new(cell_w, cell_h), color);
        }
    }

    // Grid lines over the fills
    for col in 1..columns.len() {
        let x = origin.x + col as f64 * cell_w;
        surface.line(Point::new(x, origin.y), Point::new(x, origin.y + grid_h), GRID_STROKE);
    }
    for row in 1..rows {
        let y = origin.y + row as f64 * cell_h;
        surface.line(Point::new(origin.x, y), Point::new(origin.x + grid_w, y), GRID_STROKE);
    }
    surface.stroke_rect(origin, Size::new(grid_w, grid_h), FRAME_STROKE);

    // Band upper edges, right of the grid
    let label_style = TextStyle::new(LABEL_FONT).color(LABEL_COLOR);
    for row in 0..rows {
        let band = rows - 1 - row;
        let at = Point::new(origin.x + grid_w + 1.5, origin.y + row as f64 * cell_h + cell_h * 0.5 + 1.0);
        surface.text(at, &format_band(VELOCITY_BANDS[band]), label_style.clone());
    }
    surface.text(
        Point::new(origin.x + grid_w + 1.5, origin.y + grid_h + 4.0),
        "mm/s",
        label_style.clone(),
    );

    // Group and foundation labels under the grid
    let centered = label_style.anchor(Anchor::Middle);
    let group_y = origin.y + grid_h + 4.5;
    let per_group = columns.len() / MachineGroup::ALL.len();
    for (i, group) in MachineGroup::ALL.iter().enumerate() {
        let span = cell_w * per_group as f64;
        let cx = origin.x + i as f64 * span + span / 2.0;
        surface.text(Point::new(cx, group_y), group.label(), centered.clone().bold());
    }
    for (col, &(_, foundation)) in columns.iter().enumerate() {
        let cx = origin.x + col as f64 * cell_w + cell_w / 2.0;
        let text = match variant {
            ThresholdVariant::Full => foundation.label(),
            ThresholdVariant::Compact => "",
        };
        if !text.is_empty() {
            surface.text(Point::new(cx, group_y + 4.0), text, centered.clone());
        }
    }
    if variant == ThresholdVariant::Compact {
        for (i, group) in MachineGroup::ALL.iter().enumerate() {
            let cx = origin.x + i as f64 * cell_w + cell_w / 2.0;
            surface.text(Point::new(cx, group_y + 4.0), group.description(), centered.clone());
        }
    }
}

fn format_band(edge: f64) -> String {
    if edge.fract() == 0.0 {
        format!("{:.0}", edge)
    } else {
        format!("{}", edge)
    }
}
