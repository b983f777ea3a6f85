//! Waveform to amplitude spectrum
//!
//! Collectors that upload raw time-domain captures instead of spectra get
//! their spectrum computed here: Hann-windowed frames with 50% overlap,
//! magnitudes averaged across frames, scaled to single-sided peak amplitude
//! and cut at the report's frequency ceiling.

use crate::model::{Axis, SpectrumPoint, SpectrumSeries, Waveform, FREQUENCY_MAX_HZ};
use rustfft::{num_complex::Complex, FftPlanner};

/// Largest frame; longer captures are averaged over several frames
const FFT_SIZE: usize = 4096;
/// Shortest capture worth transforming
pub const MIN_SAMPLES: usize = 64;

/// Hanning window function
fn hanning_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// Largest power of two that fits in `len`, capped at [`FFT_SIZE`]
fn frame_size(len: usize) -> usize {
    if len >= FFT_SIZE {
        FFT_SIZE
    } else {
        1 << (usize::BITS - 1 - len.leading_zeros())
    }
}

/// Amplitude spectrum of a waveform, or `None` when the capture is too short
/// or has no usable sample rate.
pub fn spectrum_from_waveform(axis: Axis, waveform: &Waveform) -> Option<SpectrumSeries> {
    let samples = &waveform.samples;
    let sample_rate = waveform.sample_rate;
    if samples.len() < MIN_SAMPLES || !sample_rate.is_finite() || sample_rate <= 0.0 {
        return None;
    }
    if samples.iter().any(|s| !s.is_finite()) {
        return None;
    }

    let size = frame_size(samples.len());
    let hop = size / 2;
    let window = hanning_window(size);
    // Coherent gain: a full-scale sine of amplitude A reads A after scaling
    let window_sum: f64 = window.iter().sum();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(size);

    let bins = size / 2 + 1;
    let mut accumulated = vec![0.0; bins];
    let mut frames = 0usize;
    let mut start = 0;
    while start + size <= samples.len() {
        let mut buffer: Vec<Complex<f64>> = samples[start..start + size]
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut buffer);
        for (acc, c) in accumulated.iter_mut().zip(buffer.iter()) {
            *acc += c.norm();
        }
        frames += 1;
        start += hop;
    }

    let resolution = sample_rate / size as f64;
    let points = accumulated.iter().enumerate().map_while(|(k, &sum)| {
        let frequency = k as f64 * resolution;
        if frequency > FREQUENCY_MAX_HZ {
            return None;
        }
        let scale = if k == 0 || k == size / 2 { 1.0 } else { 2.0 };
        Some(SpectrumPoint { frequency, amplitude: scale * sum / frames as f64 / window_sum })
    });
    Some(SpectrumSeries::new(axis, points))
}
