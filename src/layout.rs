//! Page geometry and section heights
//!
//! All layout arithmetic in the assembler reads from [`LayoutMetrics`], so
//! page breaks can be tested under different geometries without touching the
//! drawing code. Units are millimetres on a portrait page.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub page_width: f64,
    pub page_height: f64,
    /// Left/right margin and the gap between header band and content
    pub margin: f64,
    pub header_height: f64,
    /// Distance from the page bottom to the footer text baseline
    pub footer_offset: f64,
    /// Space reserved above the footer text; content never starts below it
    pub footer_height: f64,
    pub row_height: f64,
    pub table_header_height: f64,
    /// Height of one spectrum panel (plot area only)
    pub chart_height: f64,
    /// Vertical distance between the two panels of a gallery page
    pub chart_gap: f64,
    pub threshold_chart_height: f64,
    pub section_gap: f64,
    pub body_font_size: f64,
    pub heading_font_size: f64,
    /// Split data tables across pages instead of letting them overflow
    pub flow_tables: bool,
    pub brand_name: String,
    pub footer_link: String,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 14.0,
            header_height: 24.0,
            footer_offset: 8.0,
            footer_height: 14.0,
            row_height: 7.0,
            table_header_height: 8.0,
            chart_height: 95.0,
            chart_gap: 26.0,
            threshold_chart_height: 110.0,
            section_gap: 6.0,
            body_font_size: 9.0,
            heading_font_size: 13.0,
            flow_tables: false,
            brand_name: "AAMS".to_string(),
            footer_link: "www.aams.io".to_string(),
        }
    }
}

impl LayoutMetrics {
    /// Defaults, overridden by an optional TOML/JSON/YAML file, overridden in
    /// turn by `VIBEREPORT_LAYOUT_<FIELD>` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("VIBEREPORT_LAYOUT").try_parsing(true))
            .build()?;
        let metrics: LayoutMetrics = settings.try_deserialize()?;
        metrics.validate()?;
        Ok(metrics)
    }

    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// First y coordinate available to content
    pub fn content_top(&self) -> f64 {
        self.header_height + self.margin
    }

    /// Last y coordinate available to content
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.footer_height
    }

    pub fn content_height(&self) -> f64 {
        self.content_bottom() - self.content_top()
    }

    /// Vertical space one gallery panel occupies including its title and
    /// axis labels
    pub fn chart_slot_height(&self) -> f64 {
        self.chart_height + self.chart_gap
    }

    /// Reject geometries under which no section could be placed.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("header_height", self.header_height),
            ("row_height", self.row_height),
            ("table_header_height", self.table_header_height),
            ("chart_height", self.chart_height),
            ("threshold_chart_height", self.threshold_chart_height),
            ("body_font_size", self.body_font_size),
            ("heading_font_size", self.heading_font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ReportError::Layout(format!("{} must be positive, got {}", name, value)));
            }
        }
        let non_negative = [
            ("margin", self.margin),
            ("footer_offset", self.footer_offset),
            ("footer_height", self.footer_height),
            ("chart_gap", self.chart_gap),
            ("section_gap", self.section_gap),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ReportError::Layout(format!("{} must not be negative, got {}", name, value)));
            }
        }
        if self.content_width() <= 0.0 {
            return Err(ReportError::Layout("margins leave no content width".to_string()));
        }
        if self.content_height() < self.table_header_height + self.row_height {
            return Err(ReportError::Layout(format!(
                "content region of {:.1} cannot hold a table header and one row",
                self.content_height()
            )));
        }
        if self.content_height() < 2.0 * self.chart_slot_height() {
            return Err(ReportError::Layout(format!(
                "content region of {:.1} cannot hold two chart panels of {:.1}",
                self.content_height(),
                self.chart_slot_height()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_geometry_is_a4() {
        let m = LayoutMetrics::default();
        assert_eq!((m.page_width, m.page_height), (210.0, 297.0));
        assert_eq!(m.content_top(), 38.0);
        assert_eq!(m.content_bottom(), 283.0);
        assert_eq!(m.content_width(), 182.0);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_two_charts_fit_default_page() {
        let m = LayoutMetrics::default();
        assert!(2.0 * m.chart_slot_height() <= m.content_height());
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut m = LayoutMetrics::default();
        m.row_height = 0.0;
        assert!(matches!(m.validate(), Err(ReportError::Layout(_))));

        let mut m = LayoutMetrics::default();
        m.margin = 120.0;
        assert!(m.validate().is_err());

        let mut m = LayoutMetrics::default();
        m.chart_height = 200.0;
        assert!(m.validate().is_err());

        let mut m = LayoutMetrics::default();
        m.page_height = f64::NAN;
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "row_height = 9.5\nflow_tables = true\nbrand_name = \"ACME\"").unwrap();

        let m = LayoutMetrics::load(Some(file.path())).unwrap();
        assert_eq!(m.row_height, 9.5);
        assert!(m.flow_tables);
        assert_eq!(m.brand_name, "ACME");
        assert_eq!(m.page_width, 210.0);
    }

    #[test]
    fn test_environment_overrides_without_file() {
        std::env::set_var("VIBEREPORT_LAYOUT_SECTION_GAP", "4.5");
        let m = LayoutMetrics::load(None).unwrap();
        std::env::remove_var("VIBEREPORT_LAYOUT_SECTION_GAP");
        assert_eq!(m.section_gap, 4.5);
        assert_eq!(m.row_height, 7.0);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "page_height = 50.0").unwrap();
        assert!(LayoutMetrics::load(Some(file.path())).is_err());
    }
}
