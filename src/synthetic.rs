//! Placeholder measurements for bearings without sensor data
//!
//! Values scale with severity so a placeholder report still looks like the
//! machine's condition: Normal uses the base ranges, each level above adds
//! half of them again.
//!
//! | Quantity | Base range | Unit |
//! |--------------|---------------|---------|
//! | velocity | 0.5 - 2.5 | mm/s rms |
//! | acceleration | 0.2 - 1.2 | g rms |
//! | envelope | 0.05 - 0.5 | gE |

use crate::model::{Axis, AxisMetrics, SpectrumPoint, SpectrumSeries, FREQUENCY_MAX_HZ};
use crate::severity::SeverityLevel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Spectrum resolution (Hz)
pub const FREQUENCY_STEP_HZ: f64 = 2.5;

/// Characteristic peaks: running speed, its harmonics, a bearing tone and
/// its second harmonic. (frequency Hz, base height)
pub const PEAKS: [(f64, f64); 5] = [(50.0, 1.0), (100.0, 0.6), (150.0, 0.35), (180.0, 0.25), (360.0, 0.4)];

const NOISE_FLOOR: f64 = 0.05;
const PEAK_SIGMA_HZ: f64 = 3.0;

pub const VELOCITY_RANGE: (f64, f64) = (0.5, 2.5);
pub const ACCELERATION_RANGE: (f64, f64) = (0.2, 1.2);
pub const ENVELOPE_RANGE: (f64, f64) = (0.05, 0.5);

/// Scale factor applied to every synthetic value
pub fn multiplier(severity: SeverityLevel) -> f64 {
    match severity {
        SeverityLevel::Normal => 1.0,
        SeverityLevel::Satisfactory => 1.5,
        SeverityLevel::Alert => 2.0,
        SeverityLevel::Unacceptable => 2.5,
    }
}

/// Metrics and spectra for all three axes of one bearing.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticBearing {
    metrics: [AxisMetrics; 3],
    spectra: [SpectrumSeries; 3],
}

impl SyntheticBearing {
    pub fn new(metrics: [AxisMetrics; 3], spectra: [SpectrumSeries; 3]) -> Self {
        Self { metrics, spectra }
    }

    pub fn metrics(&self, axis: Axis) -> AxisMetrics {
        self.metrics[axis.index()]
    }

    pub fn spectrum(&self, axis: Axis) -> &SpectrumSeries {
        &self.spectra[axis.index()]
    }

    pub fn into_spectrum(self, axis: Axis) -> SpectrumSeries {
        let [h, v, a] = self.spectra;
        match axis {
            Axis::Horizontal => h,
            Axis::Vertical => v,
            Axis::Axial => a,
        }
    }
}

/// Source of placeholder data. Injected into the assembler so tests can use
/// fixed values.
pub trait Synthesizer {
    fn synthesize(&mut self, severity: SeverityLevel) -> SyntheticBearing;
}

/// Uniform random values in the documented ranges.
#[derive(Debug)]
pub struct RandomSynthesizer {
    rng: StdRng,
}

impl RandomSynthesizer {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Reproducible output for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    fn in_range(&mut self, (lo, hi): (f64, f64), scale: f64) -> f64 {
        self.rng.gen_range(lo..hi) * scale
    }

    fn metrics(&mut self, scale: f64) -> AxisMetrics {
        AxisMetrics {
            velocity: self.in_range(VELOCITY_RANGE, scale),
            acceleration: self.in_range(ACCELERATION_RANGE, scale),
            envelope: self.in_range(ENVELOPE_RANGE, scale),
        }
    }

    fn spectrum(&mut self, axis: Axis, scale: f64) -> SpectrumSeries {
        let heights: Vec<(f64, f64)> = PEAKS
            .iter()
            .map(|&(freq, base)| (freq, base * scale * self.rng.gen_range(0.8..1.2)))
            .collect();

        let steps = (FREQUENCY_MAX_HZ / FREQUENCY_STEP_HZ).round() as usize;
        let points: Vec<SpectrumPoint> = (0..=steps)
            .map(|i| {
                let frequency = i as f64 * FREQUENCY_STEP_HZ;
                let noise = self.rng.gen_range(0.0..NOISE_FLOOR) * scale;
                let peaks: f64 = heights
                    .iter()
                    .map(|&(center, height)| {
                        let d = (frequency - center) / PEAK_SIGMA_HZ;
                        height * (-0.5 * d * d).exp()
                    })
                    .sum();
                SpectrumPoint { frequency, amplitude: noise + peaks }
            })
            .collect();
        SpectrumSeries::new(axis, points)
    }
}

impl Default for RandomSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer for RandomSynthesizer {
    fn synthesize(&mut self, severity: SeverityLevel) -> SyntheticBearing {
        let scale = multiplier(severity);
        let metrics = Axis::ALL.map(|_| self.metrics(scale));
        let spectra = Axis::ALL.map(|axis| self.spectrum(axis, scale));
        SyntheticBearing { metrics, spectra }
    }
}
