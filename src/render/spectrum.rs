//! Frequency/amplitude line chart for one axis of one bearing
//!
//! Each chart scales its own Y axis to the series maximum, so two panels on
//! the same page are not directly comparable by height. The X axis always
//! spans the full `0..=FREQUENCY_MAX_HZ` domain.

use super::surface::{Anchor, Point, Size, Stroke, Surface, TextStyle};
use crate::model::{SpectrumSeries, FREQUENCY_MAX_HZ};
use crate::severity::Rgb;

const PANEL_FILL: Rgb = Rgb(248, 249, 251);
const GRID_STROKE: Stroke = Stroke { color: Rgb(222, 226, 230), width: 0.2 };
const BORDER_STROKE: Stroke = Stroke { color: Rgb(120, 120, 120), width: 0.3 };
const LABEL_COLOR: Rgb = Rgb(70, 70, 70);
const HORIZONTAL_GRID_LINES: usize = 5;
const VERTICAL_GRID_LINES: usize = 10;
const X_TICKS: [f64; 3] = [0.0, 500.0, 1000.0];
const FILL_OPACITY: f64 = 0.15;

pub const X_LABEL: &str = "Frequency (Hz)";
pub const Y_LABEL: &str = "Amplitude (mm/s)";

/// Map one spectrum point into the plot box.
///
/// `max_amp` must be positive; callers substitute 1.0 for an all-zero series.
pub fn to_screen(origin: Point, size: Size, frequency: f64, amplitude: f64, max_amp: f64) -> Point {
    Point::new(
        origin.x + (frequency / FREQUENCY_MAX_HZ) * size.width,
        origin.y + size.height - (amplitude / max_amp) * size.height,
    )
}

/// Draw a spectrum panel with its plot area at `origin` of `size`.
///
/// Title, tick labels and axis labels sit outside the plot box: the title
/// above, the X axis text below and the Y label to the left. An empty series
/// draws the frame, grid and labels only.
pub fn draw_spectrum_chart(
    surface: &mut dyn Surface,
    origin: Point,
    size: Size,
    series: &SpectrumSeries,
    title: &str,
    color: Rgb,
) {
    surface.fill_rect(origin, size, PANEL_FILL);

    for i in 0..HORIZONTAL_GRID_LINES {
        let y = origin.y + size.height * i as f64 / HORIZONTAL_GRID_LINES as f64;
        surface.line(Point::new(origin.x, y), Point::new(origin.x + size.width, y), GRID_STROKE);
    }
    for i in 0..VERTICAL_GRID_LINES {
        let x = origin.x + size.width * i as f64 / VERTICAL_GRID_LINES as f64;
        surface.line(Point::new(x, origin.y), Point::new(x, origin.y + size.height), GRID_STROKE);
    }
    surface.stroke_rect(origin, size, BORDER_STROKE);

    surface.text(
        Point::new(origin.x, origin.y - 3.0),
        title,
        TextStyle::new(10.0).bold(),
    );

    let tick_style = TextStyle::new(7.0).color(LABEL_COLOR).anchor(Anchor::Middle);
    for tick in X_TICKS {
        let x = origin.x + tick / FREQUENCY_MAX_HZ * size.width;
        surface.text(Point::new(x, origin.y + size.height + 4.0), &format!("{:.0}", tick), tick_style.clone());
    }
    surface.text(
        Point::new(origin.x + size.width / 2.0, origin.y + size.height + 9.0),
        X_LABEL,
        TextStyle::new(8.0).color(LABEL_COLOR).anchor(Anchor::Middle),
    );
    surface.text(
        Point::new(origin.x - 4.0, origin.y + size.height / 2.0),
        Y_LABEL,
        TextStyle::new(8.0).color(LABEL_COLOR).anchor(Anchor::Middle).rotate(-90.0),
    );

    if series.len() < 2 {
        return;
    }

    let max_amp = match series.max_amplitude() {
        m if m > 0.0 => m,
        _ => 1.0,
    };
    let curve: Vec<Point> = series
        .points()
        .iter()
        .map(|p| to_screen(origin, size, p.frequency, p.amplitude, max_amp))
        .collect();

    let baseline = origin.y + size.height;
    let mut area = curve.clone();
    if let (Some(first), Some(last)) = (curve.first(), curve.last()) {
        area.push(Point::new(last.x, baseline));
        area.push(Point::new(first.x, baseline));
    }
    surface.polygon(area, color, FILL_OPACITY);
    surface.polyline(curve, Stroke::new(color, 0.35));
}
