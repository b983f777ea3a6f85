//! Per-bearing measurement resolution
//!
//! A bearing record may carry real data in several shapes. For each axis the
//! spectrum is taken from the first source that yields points:
//!
//! 1. `spectra[axis]`
//! 2. legacy `fftData` (vertical axis only)
//! 3. an FFT of the raw waveform for that axis
//! 4. the synthetic generator
//!
//! Metrics come from `metrics[axis]` or the synthetic generator. Synthesis
//! runs at most once per bearing, at the bearing's own severity when it has
//! a label and at the machine's otherwise.

pub mod spectral;

use crate::model::{Axis, AxisMetrics, BearingRecord, Provenance, SpectrumSeries};
use crate::severity::{classify, SeverityLevel};
use crate::synthetic::{SyntheticBearing, Synthesizer};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxis {
    pub axis: Axis,
    pub metrics: AxisMetrics,
    pub metrics_source: Provenance,
    pub spectrum: SpectrumSeries,
    pub spectrum_source: Provenance,
}

impl ResolvedAxis {
    pub fn is_synthetic(&self) -> bool {
        self.metrics_source == Provenance::Synthetic || self.spectrum_source == Provenance::Synthetic
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBearing {
    pub id: String,
    pub label: String,
    pub severity: SeverityLevel,
    /// H, V, A
    pub axes: [ResolvedAxis; 3],
}

impl ResolvedBearing {
    pub fn axis(&self, axis: Axis) -> &ResolvedAxis {
        &self.axes[axis.index()]
    }
}

/// Severity used for a bearing's synthetic data
pub fn bearing_severity(bearing: &BearingRecord, machine: SeverityLevel) -> SeverityLevel {
    bearing.status_label().map(classify).unwrap_or(machine)
}

pub fn resolve_bearing(
    bearing: &BearingRecord,
    machine_severity: SeverityLevel,
    synth: &mut dyn Synthesizer,
) -> ResolvedBearing {
    let severity = bearing_severity(bearing, machine_severity);
    let mut synthetic: Option<SyntheticBearing> = None;

    let axes = Axis::ALL.map(|axis| {
        let (spectrum, spectrum_source) = match measured_spectrum(bearing, axis) {
            Some(series) => (series, Provenance::Measured),
            None => (
                synthetic
                    .get_or_insert_with(|| synth.synthesize(severity))
                    .spectrum(axis)
                    .clone(),
                Provenance::Synthetic,
            ),
        };
        let (metrics, metrics_source) = match bearing.metrics.get(axis) {
            Some(m) => (*m, Provenance::Measured),
            None => (
                synthetic.get_or_insert_with(|| synth.synthesize(severity)).metrics(axis),
                Provenance::Synthetic,
            ),
        };
        debug!(
            bearing = bearing.id(),
            axis = axis.code(),
            spectrum = ?spectrum_source,
            metrics = ?metrics_source,
            "resolved axis"
        );
        ResolvedAxis { axis, metrics, metrics_source, spectrum, spectrum_source }
    });

    ResolvedBearing {
        id: bearing.id().to_string(),
        label: bearing.label().to_string(),
        severity,
        axes,
    }
}

fn measured_spectrum(bearing: &BearingRecord, axis: Axis) -> Option<SpectrumSeries> {
    let non_empty = |s: SpectrumSeries| if s.is_empty() { None } else { Some(s) };

    if let Some(points) = bearing.spectra.get(axis) {
        if let Some(series) = non_empty(SpectrumSeries::new(axis, points.iter().copied())) {
            return Some(series);
        }
    }
    if axis == Axis::Vertical {
        if let Some(series) = non_empty(SpectrumSeries::new(axis, bearing.fft_data.iter().copied())) {
            return Some(series);
        }
    }
    bearing
        .waveform(axis)
        .and_then(|w| spectral::spectrum_from_waveform(axis, w))
        .and_then(non_empty)
}
