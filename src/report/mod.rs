//! Report assembly and output
//!
//! A report is built in one pass by [`ReportAssembler`], a small state
//! machine whose stages always run in this order:
//!
//! | Stage | Output |
//! |-----------------|---------------------------------------------------|
//! | FrontMatter | severity legend and ISO reference chart, one page |
//! | MachineDetail | identity fields, status badge, narrative text |
//! | DataTable | one row per bearing and axis |
//! | SpectrumGallery | two spectrum panels per page |
//! | Finalized | footers stamped, document handed over |
//!
//! Finished documents are written by the format modules:
//!
//! - **HTML**: one printable page per `<section>`, each an inline SVG
//! - **JSON**: the raw display list, for other renderers and tests
//!
//! # Usage
//!
//! ```ignore
//! use vibereport::report::{self, Mode, ReportAssembler};
//!
//! let doc = ReportAssembler::new(&machine, &machine.bearings, Mode::AllBearings, metrics, &mut synth)?
//!     .run()?;
//! report::generate(doc.file_name(), &doc)?;  // HTML
//! report::generate("report.json", &doc)?;    // JSON
//! ```

pub mod html;
pub mod json;
mod text;

pub use text::{narrative, NarrativeSet};

use crate::error::{ReportError, Result};
use crate::layout::LayoutMetrics;
use crate::measurement::{resolve_bearing, ResolvedBearing};
use crate::model::{Axis, AxisMetrics, BearingRecord, MachineRecord, Provenance, NOT_AVAILABLE};
use crate::render::page::{Page, PageManager, HEADER_FILL};
use crate::render::surface::{line_height, wrap_text, Image, Point, Size, Stroke, Surface, TextStyle};
use crate::render::{draw_spectrum_chart, draw_threshold_chart, ThresholdVariant};
use crate::severity::{classify_opt, classify_velocity, Rgb, SeverityLevel};
use crate::synthetic::Synthesizer;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Extension of the default artifact
pub const DEFAULT_EXTENSION: &str = "html";

pub const FRONT_MATTER_TITLE: &str = "Vibration Severity Reference";
pub const TABLE_TITLE: &str = "Measurement Summary";
pub const GALLERY_TITLE: &str = "Spectrum Analysis";

/// Table columns and their share of the content width
const COLUMNS: [(&str, f64); 5] = [
    ("Bearing", 0.32),
    ("Axis", 0.12),
    ("Velocity (mm/s)", 0.20),
    ("Acceleration (g)", 0.18),
    ("Envelope (gE)", 0.18),
];
const SYNTHETIC_NOTE: &str = "* Placeholder values: no sensor data was available for these axes.";
const ROW_RULE: Stroke = Stroke { color: Rgb(210, 210, 210), width: 0.2 };
const DETAIL_LABEL_WIDTH: f64 = 45.0;
/// Space left of a spectrum panel for the rotated Y label
const PANEL_LABEL_SPACE: f64 = 10.0;
/// Space above a spectrum panel for its title
const PANEL_TITLE_SPACE: f64 = 8.0;

/// Which bearings a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Mode {
    AllBearings,
    /// One bearing, by `_id` or `bearingId`
    SingleBearing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    FrontMatter,
    MachineDetail,
    DataTable,
    SpectrumGallery,
    Finalized,
}

impl Stage {
    fn next(self) -> Stage {
        match self {
            Stage::FrontMatter => Stage::MachineDetail,
            Stage::MachineDetail => Stage::DataTable,
            Stage::DataTable => Stage::SpectrumGallery,
            Stage::SpectrumGallery | Stage::Finalized => Stage::Finalized,
        }
    }
}

/// One data-table row as placed in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub bearing_id: String,
    pub bearing_label: String,
    pub axis: Axis,
    pub metrics: AxisMetrics,
    pub synthetic: bool,
    /// Zero-based page index
    pub page: usize,
}

/// Where a spectrum panel landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelPlacement {
    pub bearing_id: String,
    pub axis: Axis,
    pub page: usize,
    /// 0 = upper panel, 1 = lower panel
    pub slot: usize,
}

/// A finalized report. Read-only.
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    file_name: String,
    title: String,
    machine_id: String,
    severity: SeverityLevel,
    mode: Mode,
    generated_on: NaiveDate,
    page_size: Size,
    table_rows: Vec<TableRow>,
    panels: Vec<PanelPlacement>,
    pages: Vec<Page>,
}

impl ReportDocument {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn severity(&self) -> SeverityLevel {
        self.severity
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn generated_on(&self) -> NaiveDate {
        self.generated_on
    }

    /// Physical page size (mm)
    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn table_rows(&self) -> &[TableRow] {
        &self.table_rows
    }

    pub fn panels(&self) -> &[PanelPlacement] {
        &self.panels
    }
}

/// Builds one [`ReportDocument`] from a machine and its bearings.
pub struct ReportAssembler<'a> {
    machine: &'a MachineRecord,
    bearings: Vec<&'a BearingRecord>,
    mode: Mode,
    date: NaiveDate,
    variant: ThresholdVariant,
    severity: SeverityLevel,
    synth: &'a mut dyn Synthesizer,
    pages: PageManager,
    stage: Stage,
    resolved: Vec<ResolvedBearing>,
    rows: Vec<TableRow>,
    panels: Vec<PanelPlacement>,
}

impl<'a> ReportAssembler<'a> {
    /// Validates `metrics` and selects the bearings `mode` asks for. A single
    /// bearing id that matches nothing selects no bearings.
    pub fn new(
        machine: &'a MachineRecord,
        bearings: &'a [BearingRecord],
        mode: Mode,
        metrics: LayoutMetrics,
        synth: &'a mut dyn Synthesizer,
    ) -> Result<Self> {
        metrics.validate()?;
        let selected: Vec<&BearingRecord> = match &mode {
            Mode::AllBearings => bearings.iter().collect(),
            Mode::SingleBearing(id) => bearings
                .iter()
                .filter(|b| b.id() == id.as_str() || b.bearing_id.as_deref() == Some(id.as_str()))
                .collect(),
        };
        let severity = classify_opt(machine.status_label());
        debug!(machine = machine.title(), bearings = selected.len(), severity = %severity, "assembler ready");

        Ok(Self {
            machine,
            bearings: selected,
            mode,
            date: chrono::Local::now().date_naive(),
            variant: ThresholdVariant::Full,
            severity,
            synth,
            pages: PageManager::new(metrics, None),
            stage: Stage::FrontMatter,
            resolved: Vec::new(),
            rows: Vec::new(),
            panels: Vec::new(),
        })
    }

    /// Brand mark for page headers. Only takes effect before the first page.
    pub fn with_logo(mut self, logo: Option<Arc<Image>>) -> Self {
        if self.pages.page_count() == 0 {
            self.pages = PageManager::new(self.pages.metrics().clone(), logo);
        }
        self
    }

    /// Report date used in the filename and the detail section
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_threshold_variant(mut self, variant: ThresholdVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn severity(&self) -> SeverityLevel {
        self.severity
    }

    /// Run the current stage and move to the next. Returns the new stage.
    pub fn step(&mut self) -> Result<Stage> {
        match self.stage {
            Stage::FrontMatter => self.front_matter()?,
            Stage::MachineDetail => self.machine_detail()?,
            Stage::DataTable => self.data_table()?,
            Stage::SpectrumGallery => self.spectrum_gallery()?,
            Stage::Finalized => {
                return Err(ReportError::Assembly("report is already finalized".to_string()));
            }
        }
        self.stage = self.stage.next();
        debug!(stage = ?self.stage, pages = self.pages.page_count(), "stage complete");
        Ok(self.stage)
    }

    /// Run every remaining stage and return the finished document.
    pub fn run(mut self) -> Result<ReportDocument> {
        while self.stage != Stage::Finalized {
            self.step()?;
        }
        self.finish()
    }

    /// Hand over the document. Fails unless every stage has run.
    pub fn finish(self) -> Result<ReportDocument> {
        if self.stage != Stage::Finalized {
            return Err(ReportError::Assembly(format!("cannot finalize during {:?}", self.stage)));
        }
        let metrics = self.pages.metrics().clone();
        let pages = self.pages.finish()?;
        let file_name = file_name(self.machine, &self.mode, self.date, DEFAULT_EXTENSION);
        info!(
            file = %file_name,
            pages = pages.len(),
            rows = self.rows.len(),
            panels = self.panels.len(),
            "report assembled"
        );
        Ok(ReportDocument {
            file_name,
            title: self.machine.title().to_string(),
            machine_id: or_na(self.machine.id()),
            severity: self.severity,
            mode: self.mode,
            generated_on: self.date,
            page_size: Size::new(metrics.page_width, metrics.page_height),
            table_rows: self.rows,
            panels: self.panels,
            pages,
        })
    }

    // ------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------

    fn front_matter(&mut self) -> Result<()> {
        let m = self.pages.metrics().clone();
        let x = m.margin;
        self.pages.new_page(Some(FRONT_MATTER_TITLE));

        self.heading("Severity Levels")?;
        let small = m.body_font_size - 1.0;
        for level in SeverityLevel::ALL {
            let y = self.pages.cursor();
            let page = self.pages.current()?;
            page.fill_rect(Point::new(x, y), Size::new(6.0, 4.5), level.color());
            page.text(
                Point::new(x + 9.0, y + 3.5),
                &format!("{} - {}", level.rank(), level.name()),
                TextStyle::new(m.body_font_size).bold(),
            );
            self.pages.advance(5.0)?;
            self.paragraph(x + 9.0, m.content_width() - 9.0, level.description(), small)?;
            self.pages.advance(1.5)?;
        }

        self.pages.advance(m.section_gap)?;
        self.heading("ISO 10816-3 Vibration Severity Chart")?;
        let y = self.pages.cursor();
        let height = m.threshold_chart_height.min(self.pages.remaining());
        draw_threshold_chart(
            self.pages.current()?,
            Point::new(x, y),
            Size::new(m.content_width(), height),
            self.variant,
        );
        self.pages.advance(height)?;
        Ok(())
    }

    fn machine_detail(&mut self) -> Result<()> {
        let m = self.pages.metrics().clone();
        let x = m.margin;
        let title = self.machine.title().to_string();
        self.pages.new_page(Some(&title));

        self.heading("Machine Details")?;
        for (label, value) in self.identity_fields() {
            let y = self.pages.cursor() + m.row_height * 0.7;
            let page = self.pages.current()?;
            page.text(Point::new(x, y), label, TextStyle::new(m.body_font_size).bold());
            page.text(Point::new(x + DETAIL_LABEL_WIDTH, y), &value, TextStyle::new(m.body_font_size));
            self.pages.advance(m.row_height)?;
        }

        let y = self.pages.cursor() + 2.0;
        let level = self.severity;
        let page = self.pages.current()?;
        page.rounded_rect(Point::new(x, y), Size::new(60.0, m.row_height + 1.0), level.color(), 1.5);
        page.text(
            Point::new(x + 3.0, y + (m.row_height + 1.0) * 0.68),
            &format!("Status: {}", level.name()),
            TextStyle::new(m.body_font_size + 1.0).color(badge_text_color(level)).bold(),
        );
        self.pages.advance(m.row_height + 4.0 + m.section_gap)?;

        let narrative = narrative(level);
        self.heading("Observation")?;
        self.paragraph(x, m.content_width(), narrative.observation, m.body_font_size)?;
        self.pages.advance(m.section_gap)?;
        self.heading("Recommendation")?;
        self.paragraph(x, m.content_width(), narrative.recommendation, m.body_font_size)?;
        self.pages.advance(m.section_gap)?;
        Ok(())
    }

    fn data_table(&mut self) -> Result<()> {
        let m = self.pages.metrics().clone();
        self.resolve_bearings();

        let entries: Vec<(usize, Axis)> = (0..self.resolved.len())
            .flat_map(|b| Axis::ALL.map(|axis| (b, axis)))
            .collect();
        let any_synthetic = self.resolved.iter().any(|b| b.axes.iter().any(|a| a.is_synthetic()));
        let note_rows = usize::from(any_synthetic);
        let projected = heading_height(&m)
            + m.table_header_height
            + (entries.len().max(1) + note_rows) as f64 * m.row_height;
        if projected > self.pages.remaining() {
            debug!(projected, remaining = self.pages.remaining(), "table moves to a new page");
            self.pages.new_page(Some(TABLE_TITLE));
        }

        self.heading(TABLE_TITLE)?;
        self.table_header()?;
        if entries.is_empty() {
            let y = self.pages.cursor() + m.row_height * 0.68;
            self.pages.current()?.text(
                Point::new(m.margin + 1.5, y),
                "No bearing data available",
                TextStyle::new(m.body_font_size),
            );
            self.pages.advance(m.row_height)?;
            return Ok(());
        }

        for (b, axis) in entries {
            if m.flow_tables && self.pages.remaining() < m.row_height {
                self.pages.new_page(Some(TABLE_TITLE));
                self.table_header()?;
            }
            self.table_row(b, axis)?;
        }

        if self.rows.iter().any(|r| r.synthetic) {
            let y = self.pages.cursor() + m.row_height * 0.68;
            self.pages.current()?.text(
                Point::new(m.margin, y),
                SYNTHETIC_NOTE,
                TextStyle::new(m.body_font_size - 1.5).color(Rgb(110, 110, 110)),
            );
            self.pages.advance(m.row_height)?;
        }
        Ok(())
    }

    fn spectrum_gallery(&mut self) -> Result<()> {
        let m = self.pages.metrics().clone();
        let charts: Vec<(usize, Axis)> = (0..self.resolved.len())
            .flat_map(|b| Axis::ALL.map(|axis| (b, axis)))
            .collect();
        let total = charts.len();

        for (i, (b, axis)) in charts.into_iter().enumerate() {
            if i % 2 == 0 {
                self.pages.new_page(Some(GALLERY_TITLE));
            }
            let top = self.pages.cursor();
            let bearing = &self.resolved[b];
            let resolved = bearing.axis(axis);
            let mut title = format!("{} - {} axis", bearing.label, axis.name());
            if resolved.spectrum_source == Provenance::Synthetic {
                title.push_str(" (simulated)");
            }
            draw_spectrum_chart(
                self.pages.current()?,
                Point::new(m.margin + PANEL_LABEL_SPACE, top + PANEL_TITLE_SPACE),
                Size::new(m.content_width() - PANEL_LABEL_SPACE, m.chart_height),
                &resolved.spectrum,
                &title,
                axis_color(axis),
            );
            self.pages.advance(m.chart_slot_height())?;

            let page = self.current_index()?;
            self.panels.push(PanelPlacement {
                bearing_id: bearing.id.clone(),
                axis,
                page,
                slot: i % 2,
            });

            let count = i + 1;
            if count % 2 == 0 || count == total {
                self.pages.stamp_footer(page, page + 1)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn resolve_bearings(&mut self) {
        let machine_severity = self.severity;
        self.resolved = self
            .bearings
            .iter()
            .map(|b| resolve_bearing(b, machine_severity, &mut *self.synth))
            .collect();
    }

    fn current_index(&self) -> Result<usize> {
        self.pages
            .current_index()
            .ok_or_else(|| ReportError::Assembly("no page has been started".to_string()))
    }

    fn identity_fields(&self) -> Vec<(&'static str, String)> {
        let machine = self.machine;
        let scope = match &self.mode {
            Mode::AllBearings => "All bearings".to_string(),
            Mode::SingleBearing(id) => format!("Bearing {}", id),
        };
        vec![
            ("Machine Name", or_na(machine.display_name())),
            ("Machine ID", or_na(machine.id())),
            ("Customer ID", or_na(machine.customer_id.as_deref())),
            ("Area ID", or_na(machine.area_id.as_deref())),
            ("Sub Area ID", or_na(machine.sub_area())),
            ("Connectivity", or_na(machine.connectivity.as_deref())),
            ("Machine Type", or_na(machine.machine_type.as_deref())),
            ("Technology", or_na(machine.technology_id.as_deref())),
            ("Last Updated", or_na(machine.data_updated_time.as_deref())),
            ("Report Scope", scope),
            ("Report Date", self.date.format("%Y-%m-%d").to_string()),
        ]
    }

    fn heading(&mut self, text: &str) -> Result<()> {
        let m = self.pages.metrics().clone();
        let y = self.pages.cursor();
        let baseline = y + line_height(m.heading_font_size);
        let page = self.pages.current()?;
        page.text(
            Point::new(m.margin, baseline),
            text,
            TextStyle::new(m.heading_font_size).color(HEADER_FILL).bold(),
        );
        page.line(
            Point::new(m.margin, baseline + 1.5),
            Point::new(m.margin + m.content_width(), baseline + 1.5),
            Stroke::new(HEADER_FILL, 0.3),
        );
        self.pages.advance(heading_height(&m))?;
        Ok(())
    }

    fn paragraph(&mut self, x: f64, width: f64, text: &str, size: f64) -> Result<()> {
        let lh = line_height(size);
        let lines = wrap_text(text, width, size);
        let y = self.pages.cursor();
        let page = self.pages.current()?;
        for (i, line) in lines.iter().enumerate() {
            page.text(Point::new(x, y + lh * (i + 1) as f64), line, TextStyle::new(size));
        }
        self.pages.advance(lh * lines.len() as f64 + lh * 0.4)?;
        Ok(())
    }

    fn table_header(&mut self) -> Result<()> {
        let m = self.pages.metrics().clone();
        let y = self.pages.cursor();
        let page = self.pages.current()?;
        page.fill_rect(Point::new(m.margin, y), Size::new(m.content_width(), m.table_header_height), HEADER_FILL);
        let mut x = m.margin;
        for (label, share) in COLUMNS {
            page.text(
                Point::new(x + 1.5, y + m.table_header_height * 0.65),
                label,
                TextStyle::new(m.body_font_size).color(Rgb::WHITE).bold(),
            );
            x += share * m.content_width();
        }
        self.pages.advance(m.table_header_height)?;
        Ok(())
    }

    fn table_row(&mut self, bearing_index: usize, axis: Axis) -> Result<()> {
        let m = self.pages.metrics().clone();
        let page_index = self.current_index()?;
        let bearing = &self.resolved[bearing_index];
        let resolved = bearing.axis(axis);
        let synthetic = resolved.is_synthetic();
        let metrics = resolved.metrics;

        let label = if synthetic { format!("{}*", bearing.label) } else { bearing.label.clone() };
        let cells = [
            label,
            axis.name().to_string(),
            format!("{:.2}", metrics.velocity),
            format!("{:.2}", metrics.acceleration),
            format!("{:.2}", metrics.envelope),
        ];

        let y = self.pages.cursor();
        let width = m.content_width();
        let velocity_x = m.margin + (COLUMNS[0].1 + COLUMNS[1].1) * width;
        let page = self.pages.current()?;
        page.fill_rect(
            Point::new(velocity_x, y),
            Size::new(COLUMNS[2].1 * width, m.row_height),
            classify_velocity(metrics.velocity),
        );
        let mut x = m.margin;
        for ((_, share), cell) in COLUMNS.iter().zip(cells.iter()) {
            page.text(Point::new(x + 1.5, y + m.row_height * 0.68), cell, TextStyle::new(m.body_font_size));
            x += share * width;
        }
        page.line(
            Point::new(m.margin, y + m.row_height),
            Point::new(m.margin + width, y + m.row_height),
            ROW_RULE,
        );

        self.rows.push(TableRow {
            bearing_id: bearing.id.clone(),
            bearing_label: bearing.label.clone(),
            axis,
            metrics,
            synthetic,
            page: page_index,
        });
        self.pages.advance(m.row_height)?;
        Ok(())
    }
}

fn heading_height(m: &LayoutMetrics) -> f64 {
    line_height(m.heading_font_size) + 4.0
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

fn badge_text_color(level: SeverityLevel) -> Rgb {
    match level {
        SeverityLevel::Normal | SeverityLevel::Unacceptable => Rgb::WHITE,
        SeverityLevel::Satisfactory | SeverityLevel::Alert => Rgb::BLACK,
    }
}

fn axis_color(axis: Axis) -> Rgb {
    match axis {
        Axis::Horizontal => Rgb(31, 119, 180),
        Axis::Vertical => Rgb(214, 39, 40),
        Axis::Axial => Rgb(44, 160, 44),
    }
}

/// Replace every character outside `[A-Za-z0-9()-]` with `_`
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '(' | ')' | '-') { c } else { '_' })
        .collect()
}

/// `Report_<machine>_<scope>_<YYYY-MM-DD>.<ext>`; the scope is `all_bearings`
/// or the first 8 characters of the sanitized bearing id.
pub fn file_name(machine: &MachineRecord, mode: &Mode, date: NaiveDate, extension: &str) -> String {
    let scope = match mode {
        Mode::AllBearings => "all_bearings".to_string(),
        Mode::SingleBearing(id) => sanitize(id).chars().take(8).collect(),
    };
    format!(
        "Report_{}_{}_{}.{}",
        sanitize(machine.title()),
        scope,
        date.format("%Y-%m-%d"),
        extension
    )
}

/// Assemble a full report in one call.
pub fn assemble(
    machine: &MachineRecord,
    mode: Mode,
    metrics: &LayoutMetrics,
    logo: Option<Arc<Image>>,
    synth: &mut dyn Synthesizer,
    date: NaiveDate,
) -> Result<ReportDocument> {
    ReportAssembler::new(machine, &machine.bearings, mode, metrics.clone(), synth)?
        .with_logo(logo)
        .with_date(date)
        .run()
}

/// Write a document in the format implied by the file extension:
/// `.json` writes the display list, anything else writes HTML.
pub fn generate<P: AsRef<Path>>(path: P, doc: &ReportDocument) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = BufWriter::new(File::create(path)?);

    match ext.as_str() {
        "json" => json::write(&mut file, doc)?,
        _ => html::write(&mut file, doc)?,
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpectrumPoint;
    use crate::synthetic::RandomSynthesizer;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn bearing(id: &str) -> BearingRecord {
        BearingRecord { bearing_id: Some(id.to_string()), ..Default::default() }
    }

    fn machine(json: &str) -> MachineRecord {
        MachineRecord::from_json(json).unwrap()
    }

    fn build(machine: &MachineRecord, mode: Mode, metrics: LayoutMetrics) -> ReportDocument {
        let mut synth = RandomSynthesizer::seeded(5);
        ReportAssembler::new(machine, &machine.bearings, mode, metrics, &mut synth)
            .unwrap()
            .with_date(date())
            .run()
            .unwrap()
    }

    fn page_text(page: &Page) -> String {
        page.texts().collect::<Vec<_>>().join(" ")
    }

    fn gallery_pages(doc: &ReportDocument) -> usize {
        doc.pages().iter().filter(|p| p.title() == Some(GALLERY_TITLE)).count()
    }

    // ==========================================================================
    // END-TO-END SCENARIO TESTS
    // ==========================================================================
    //
    // An alert-level machine with two bearings: six table rows (two bearings
    // times three axes), the Alert narrative, six spectrum panels on three
    // gallery pages.
    // ==========================================================================

    #[test]
    fn test_alert_machine_with_two_bearings() {
        let mut m = machine(r#"{"machineId": "M1", "status": "alert", "type": "ONLINE"}"#);
        m.bearings = vec![bearing("B1"), bearing("B2")];
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());

        assert_eq!(doc.severity(), SeverityLevel::Alert);
        assert_eq!(doc.table_rows().len(), 6);
        assert_eq!(doc.panels().len(), 6);
        assert_eq!(gallery_pages(&doc), 3);

        let detail = page_text(&doc.pages()[1]);
        assert!(detail.contains(narrative(SeverityLevel::Alert).observation));
        assert!(detail.contains(narrative(SeverityLevel::Alert).recommendation));
        assert!(detail.contains("Status: Alert"));
        assert!(detail.contains("ONLINE"));
    }

    #[test]
    fn test_rows_and_panels_follow_bearing_then_axis_order() {
        let mut m = machine(r#"{"machineId": "M1"}"#);
        m.bearings = vec![bearing("B1"), bearing("B2")];
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());

        let order: Vec<(String, Axis)> = doc.panels().iter().map(|p| (p.bearing_id.clone(), p.axis)).collect();
        let expected: Vec<(String, Axis)> = ["B1", "B2"]
            .iter()
            .flat_map(|b| Axis::ALL.map(|a| (b.to_string(), a)))
            .collect();
        assert_eq!(order, expected);

        let rows: Vec<(String, Axis)> = doc.table_rows().iter().map(|r| (r.bearing_id.clone(), r.axis)).collect();
        assert_eq!(rows, expected);
        assert!(doc.table_rows().iter().all(|r| r.synthetic));
    }

    #[test]
    fn test_undefined_status_is_normal() {
        let doc = build(&machine(r#"{"machineId": "M2"}"#), Mode::AllBearings, LayoutMetrics::default());
        assert_eq!(doc.severity(), SeverityLevel::Normal);
        let detail = page_text(&doc.pages()[1]);
        assert!(detail.contains("Status: Normal"));
        assert!(detail.contains(narrative(SeverityLevel::Normal).recommendation));
    }

    #[test]
    fn test_id_only_machine_renders_placeholders() {
        let doc = build(&machine(r#"{"_id": "only-id"}"#), Mode::AllBearings, LayoutMetrics::default());
        let detail = page_text(&doc.pages()[1]);
        assert!(detail.contains(NOT_AVAILABLE));
        assert!(detail.contains("only-id"));
        assert!(page_text(&doc.pages()[1]).contains("No bearing data available"));
        assert_eq!(gallery_pages(&doc), 0);
        assert_eq!(doc.page_count(), 2);
    }

    // ==========================================================================
    // PAGINATION TESTS
    // ==========================================================================

    #[test]
    fn test_front_matter_is_exactly_one_page() {
        let mut m = machine(r#"{"name": "Fan"}"#);
        m.bearings = vec![bearing("B1")];
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());
        assert_eq!(doc.pages()[0].title(), Some(FRONT_MATTER_TITLE));
        assert_eq!(doc.pages()[1].title(), Some("Fan"));
        assert!(page_text(&doc.pages()[0]).contains("ISO 10816-3"));
        assert!(doc.pages()[0].cursor() <= LayoutMetrics::default().content_bottom());
    }

    #[test]
    fn test_gallery_pages_are_half_chart_count_rounded_up() {
        for n in 0..6 {
            let mut m = machine(r#"{"machineId": "M"}"#);
            m.bearings = (0..n).map(|i| bearing(&format!("B{}", i))).collect();
            let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());
            let charts = 3 * n;
            assert_eq!(doc.panels().len(), charts);
            assert_eq!(gallery_pages(&doc), (charts + 1) / 2, "bearings = {}", n);
        }
    }

    #[test]
    fn test_panel_slots_alternate() {
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = vec![bearing("B1")];
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());
        let first = doc.panels()[0].page;
        let placement: Vec<(usize, usize)> = doc.panels().iter().map(|p| (p.page - first, p.slot)).collect();
        assert_eq!(placement, vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_every_page_has_one_footer() {
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = vec![bearing("B1"), bearing("B2"), bearing("B3")];
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());
        for (i, page) in doc.pages().iter().enumerate() {
            let footers: Vec<&str> = page.texts().filter(|t| t.starts_with("Page: ")).collect();
            assert_eq!(footers, vec![format!("Page: {}", i + 1)]);
        }
    }

    #[test]
    fn test_table_moves_to_new_page_when_too_tall() {
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = (0..12).map(|i| bearing(&format!("B{}", i))).collect();
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());

        assert_eq!(doc.pages()[2].title(), Some(TABLE_TITLE));
        // No mid-table split: all 36 rows share one page and overflow it
        assert!(doc.table_rows().iter().all(|r| r.page == 2));
        assert!(doc.pages()[2].cursor() > LayoutMetrics::default().content_bottom());
    }

    #[test]
    fn test_flow_tables_split_with_repeated_header() {
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = (0..12).map(|i| bearing(&format!("B{}", i))).collect();
        let metrics = LayoutMetrics { flow_tables: true, ..LayoutMetrics::default() };
        let doc = build(&m, Mode::AllBearings, metrics.clone());

        let table_pages: Vec<usize> = {
            let mut p: Vec<usize> = doc.table_rows().iter().map(|r| r.page).collect();
            p.dedup();
            p
        };
        assert!(table_pages.len() >= 2);
        for &index in &table_pages {
            let page = &doc.pages()[index];
            assert!(page.texts().any(|t| t == "Velocity (mm/s)"));
            assert!(page.cursor() <= metrics.content_bottom() + metrics.row_height);
        }
    }

    #[test]
    fn test_table_projection_counts_synthetic_note() {
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = vec![bearing("B1"), bearing("B2")];
        let base = LayoutMetrics { chart_height: 60.0, ..LayoutMetrics::default() };

        // Space left on the detail page once the table stage begins
        let mut synth = RandomSynthesizer::seeded(5);
        let mut assembler =
            ReportAssembler::new(&m, &m.bearings, Mode::AllBearings, base.clone(), &mut synth).unwrap();
        assembler.step().unwrap();
        assembler.step().unwrap();
        assert_eq!(assembler.stage(), Stage::DataTable);
        let remaining = assembler.pages.remaining();

        // Shrink the page so the rows fit but the note row does not
        let rows_only = heading_height(&base) + base.table_header_height + 6.0 * base.row_height;
        let metrics = LayoutMetrics {
            page_height: base.page_height + rows_only + 0.5 * base.row_height - remaining,
            ..base
        };
        let doc = build(&m, Mode::AllBearings, metrics.clone());

        assert!(doc.table_rows().iter().all(|r| r.page == 2));
        let note_page = doc
            .pages()
            .iter()
            .find(|p| p.texts().any(|t| t == SYNTHETIC_NOTE))
            .unwrap();
        assert!(note_page.cursor() <= metrics.content_bottom());
    }

    // ==========================================================================
    // MODE TESTS
    // ==========================================================================

    #[test]
    fn test_single_bearing_mode() {
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = vec![bearing("B1"), bearing("B2")];
        let doc = build(&m, Mode::SingleBearing("B2".into()), LayoutMetrics::default());
        assert_eq!(doc.table_rows().len(), 3);
        assert!(doc.table_rows().iter().all(|r| r.bearing_id == "B2"));
        assert_eq!(gallery_pages(&doc), 2);
    }

    #[test]
    fn test_unknown_single_bearing_renders_empty_sections() {
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = vec![bearing("B1")];
        let doc = build(&m, Mode::SingleBearing("nope".into()), LayoutMetrics::default());
        assert!(doc.table_rows().is_empty());
        assert!(doc.panels().is_empty());
        assert!(doc.file_name().contains("_nope_"));
    }

    #[test]
    fn test_measured_rows_are_not_marked() {
        let mut b = bearing("B1");
        for axis in Axis::ALL {
            b.metrics.set(axis, AxisMetrics { velocity: 5.0, acceleration: 0.3, envelope: 0.1 });
            b.spectra.set(axis, vec![
                SpectrumPoint { frequency: 0.0, amplitude: 0.1 },
                SpectrumPoint { frequency: 50.0, amplitude: 1.0 },
            ]);
        }
        let mut m = machine(r#"{"machineId": "M"}"#);
        m.bearings = vec![b];
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());
        assert!(doc.table_rows().iter().all(|r| !r.synthetic));
        let all_text: String = doc.pages().iter().map(page_text).collect();
        assert!(!all_text.contains(SYNTHETIC_NOTE));
        assert!(!all_text.contains("(simulated)"));
    }

    // ==========================================================================
    // STATE MACHINE TESTS
    // ==========================================================================

    #[test]
    fn test_stages_run_in_order() {
        let m = machine(r#"{"machineId": "M"}"#);
        let mut synth = RandomSynthesizer::seeded(1);
        let mut assembler =
            ReportAssembler::new(&m, &m.bearings, Mode::AllBearings, LayoutMetrics::default(), &mut synth).unwrap();
        assert_eq!(assembler.stage(), Stage::FrontMatter);
        assert_eq!(assembler.step().unwrap(), Stage::MachineDetail);
        assert_eq!(assembler.step().unwrap(), Stage::DataTable);
        assert_eq!(assembler.step().unwrap(), Stage::SpectrumGallery);
        assert_eq!(assembler.step().unwrap(), Stage::Finalized);
        assert!(matches!(assembler.step(), Err(ReportError::Assembly(_))));
        assert!(assembler.finish().is_ok());
    }

    #[test]
    fn test_finish_before_final_stage_fails() {
        let m = machine(r#"{"machineId": "M"}"#);
        let mut synth = RandomSynthesizer::seeded(1);
        let mut assembler =
            ReportAssembler::new(&m, &m.bearings, Mode::AllBearings, LayoutMetrics::default(), &mut synth).unwrap();
        assembler.step().unwrap();
        assert!(assembler.finish().is_err());
    }

    #[test]
    fn test_invalid_metrics_rejected() {
        let m = machine(r#"{"machineId": "M"}"#);
        let mut synth = RandomSynthesizer::seeded(1);
        let metrics = LayoutMetrics { row_height: -1.0, ..LayoutMetrics::default() };
        assert!(ReportAssembler::new(&m, &m.bearings, Mode::AllBearings, metrics, &mut synth).is_err());
    }

    #[test]
    fn test_same_seed_same_document() {
        let mut m = machine(r#"{"machineId": "M", "status": "satisfactory"}"#);
        m.bearings = vec![bearing("B1")];
        let a = build(&m, Mode::AllBearings, LayoutMetrics::default());
        let b = build(&m, Mode::AllBearings, LayoutMetrics::default());
        assert_eq!(
            serde_json::to_string(a.pages()).unwrap(),
            serde_json::to_string(b.pages()).unwrap()
        );
    }

    // ==========================================================================
    // FILENAME TESTS
    // ==========================================================================

    #[test]
    fn test_file_name_sanitizes_machine_name() {
        let m = machine(r#"{"name": "Pump-01/X"}"#);
        let name = file_name(&m, &Mode::AllBearings, date(), "html");
        assert_eq!(name, "Report_Pump-01_X_all_bearings_2024-06-01.html");
    }

    #[test]
    fn test_file_name_truncates_bearing_id() {
        let m = machine(r#"{"name": "Fan (north)"}"#);
        let name = file_name(&m, &Mode::SingleBearing("65f0a1b2c3d4e5f6".into()), date(), "html");
        assert_eq!(name, "Report_Fan_(north)_65f0a1b2_2024-06-01.html");
    }

    #[test]
    fn test_sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize("A-z(0)9"), "A-z(0)9");
        assert_eq!(sanitize("a b.c/d\u{e9}"), "a_b_c_d_");
    }

    // ==========================================================================
    // OUTPUT TESTS
    // ==========================================================================

    #[test]
    fn test_generate_writes_complete_file() {
        let m = machine(r#"{"machineId": "M"}"#);
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        generate(&path, &doc).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_generate_reports_write_failure() {
        let m = machine(r#"{"machineId": "M"}"#);
        let doc = build(&m, Mode::AllBearings, LayoutMetrics::default());
        assert!(matches!(generate("/dev/full", &doc), Err(ReportError::Io(_))));
    }
}
