//! Drawing: the surface abstraction, fixed-size pages and the two chart
//! renderers
//!
//! - [`surface`]: display-list primitives every renderer draws through
//! - [`page`]: page list, header/footer bands and the vertical cursor
//! - [`threshold`]: the static ISO 10816-3 reference grid
//! - [`spectrum`]: one frequency/amplitude line chart

pub mod page;
pub mod spectrum;
pub mod surface;
pub mod threshold;

pub use page::{Page, PageManager};
pub use spectrum::draw_spectrum_chart;
pub use surface::{Anchor, DrawOp, Image, Point, Size, Stroke, Surface, TextStyle};
pub use threshold::{draw_threshold_chart, ThresholdVariant};
