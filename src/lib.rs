//! vibereport - Paginated vibration-health reports for rotating machines
//!
//! Given a machine record from the monitoring backend (and its bearings),
//! vibereport lays out a fixed-size, multi-page document: a severity
//! reference section, machine details with a color-coded status, a
//! measurement table and a gallery of FFT spectrum charts.
//!
//! # Overview
//!
//! Every report goes through the same stages, each starting on a fresh page
//! unless noted:
//!
//! 1. **Front matter**: severity legend and the ISO 10816-3 reference grid.
//! 2. **Machine detail**: identity fields, status badge, observation and
//!    recommendation text for the machine's severity.
//! 3. **Data table**: velocity, acceleration and envelope per bearing and
//!    axis. Continues on the detail page when it fits.
//! 4. **Spectrum gallery**: one chart per bearing and axis, two per page.
//!
//! Bearings without sensor data get placeholder values scaled to their
//! severity; those rows are marked in the table.
//!
//! # Quick Start
//!
//! ```no_run
//! use vibereport::{report, LayoutMetrics, MachineRecord, Mode, RandomSynthesizer, ReportAssembler};
//!
//! let machine = MachineRecord::from_json(&std::fs::read_to_string("machine.json")?)?;
//! let mut synth = RandomSynthesizer::new();
//! let doc = ReportAssembler::new(&machine, &machine.bearings, Mode::AllBearings, LayoutMetrics::default(), &mut synth)?
//!     .run()?;
//!
//! println!("{} pages, severity {}", doc.page_count(), doc.severity());
//! report::generate(doc.file_name(), &doc)?;
//! # Ok::<(), vibereport::ReportError>(())
//! ```
//!
//! # Severity Levels
//!
//! | Level | Name | Label |
//! |-------|--------------|--------------------------------------|
//! | 1 | Normal | `normal`, or anything unrecognized |
//! | 2 | Satisfactory | `satisfactory` |
//! | 3 | Alert | `alert` |
//! | 4 | Unacceptable | `unacceptable`, `unsatisfactory` |
//!
//! # Modules
//!
//! - [`severity`]: label and velocity classification, shared color tables
//! - [`model`]: lenient input records and spectrum series
//! - [`layout`]: page geometry and section heights
//! - [`render`]: drawing surface, pages and the two chart renderers
//! - [`measurement`]: real-or-synthetic data per bearing axis
//! - [`synthetic`]: placeholder data generator
//! - [`report`]: the assembler and the HTML/JSON writers
//! - [`branding`]: single-fetch logo cache
//! - [`serve`]: HTTP download server

pub mod branding;
pub mod error;
pub mod layout;
pub mod measurement;
pub mod model;
pub mod render;
pub mod report;
pub mod serve;
pub mod severity;
pub mod synthetic;

pub use branding::BrandingCache;
pub use error::{ReportError, Result};
pub use layout::LayoutMetrics;
pub use model::{Axis, BearingRecord, MachineRecord, SpectrumSeries};
pub use report::{Mode, ReportAssembler, ReportDocument};
pub use severity::{classify, classify_velocity, SeverityLevel};
pub use synthetic::{RandomSynthesizer, Synthesizer};
