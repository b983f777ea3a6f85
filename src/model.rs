//! Input records and per-run measurement types
//!
//! Machine and bearing records come straight from the monitoring backend as
//! JSON. Field names vary between endpoints (`_id` vs `machineId`, `status` vs
//! `statusName`), ids are sometimes numbers or `{"$oid": ...}` objects, and any
//! field may be missing. Deserialization is therefore lenient: a value of the
//! wrong shape becomes `None` instead of failing the record, and accessors
//! resolve the alternatives and fall back to `"N/A"`.

use crate::error::Result;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Upper edge of the spectrum domain (Hz). Charts always span 0..=this.
pub const FREQUENCY_MAX_HZ: f64 = 1000.0;

/// Placeholder rendered for absent fields
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Machine / bearing records
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub machine_id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub machine_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub area_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_area_id: Option<String>,
    #[serde(rename = "subareaId", default, deserialize_with = "lenient_string")]
    pub subarea_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status_name: Option<String>,
    /// Connectivity: `ONLINE` or `OFFLINE`
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub connectivity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub machine_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub technology_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub data_updated_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub bearings: Vec<BearingRecord>,
}

impl MachineRecord {
    /// Parse a machine record from JSON.
    ///
    /// Accepts the bare machine object or the `{"machine": {...}}` envelope
    /// of the machine-detail endpoint.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(text)?;
        if let Some(inner) = value.get_mut("machine") {
            if inner.is_object() {
                value = inner.take();
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// `machineId`, then `_id`
    pub fn id(&self) -> Option<&str> {
        first_present(&[&self.machine_id, &self.object_id])
    }

    /// `name`, then `machineName`
    pub fn display_name(&self) -> Option<&str> {
        first_present(&[&self.name, &self.machine_name])
    }

    /// `status`, then `statusName`
    pub fn status_label(&self) -> Option<&str> {
        first_present(&[&self.status, &self.status_name])
    }

    pub fn sub_area(&self) -> Option<&str> {
        first_present(&[&self.sub_area_id, &self.subarea_id])
    }

    /// Name used for titles and filenames: display name, id, or a fixed default
    pub fn title(&self) -> &str {
        self.display_name().or_else(|| self.id()).unwrap_or("machine")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BearingRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bearing_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status_name: Option<String>,
    /// Legacy single-axis spectrum, treated as the vertical axis
    #[serde(default, deserialize_with = "lenient_list")]
    pub fft_data: Vec<SpectrumPoint>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub spectra: PerAxis<Vec<SpectrumPoint>>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub raw_data: PerAxis<Waveform>,
    /// Older spelling of `rawData` still sent by some collectors
    #[serde(rename = "rowdata", default, deserialize_with = "lenient_value")]
    pub row_data: PerAxis<Waveform>,
    #[serde(default, deserialize_with = "lenient_value")]
    pub metrics: PerAxis<AxisMetrics>,
}

impl BearingRecord {
    /// `_id`, then `bearingId`, then `"N/A"`
    pub fn id(&self) -> &str {
        first_present(&[&self.object_id, &self.bearing_id]).unwrap_or(NOT_AVAILABLE)
    }

    /// `status`, then `statusName`
    pub fn status_label(&self) -> Option<&str> {
        first_present(&[&self.status, &self.status_name])
    }

    /// Raw waveform for an axis, from `rawData` or `rowdata`
    pub fn waveform(&self, axis: Axis) -> Option<&Waveform> {
        self.raw_data.get(axis).or_else(|| self.row_data.get(axis))
    }

    /// Human label for titles: the bearing name when present, else its id
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.id())
    }
}

fn first_present<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

// ============================================================================
// Axes and per-axis data
// ============================================================================

/// Sensing direction of a bearing measurement point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
    #[serde(rename = "A")]
    Axial,
}

impl Axis {
    /// Fixed report order: H, V, A
    pub const ALL: [Axis; 3] = [Axis::Horizontal, Axis::Vertical, Axis::Axial];

    pub fn code(self) -> &'static str {
        match self {
            Axis::Horizontal => "H",
            Axis::Vertical => "V",
            Axis::Axial => "A",
        }
    }

    /// Position in [`Axis::ALL`]
    pub fn index(self) -> usize {
        match self {
            Axis::Horizontal => 0,
            Axis::Vertical => 1,
            Axis::Axial => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Horizontal => "Horizontal",
            Axis::Vertical => "Vertical",
            Axis::Axial => "Axial",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One value per axis. Accepts `H`/`V`/`A` keys as well as the backend's
/// `H-Axis`/`V-Axis`/`A-Axis` form.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct PerAxis<T> {
    #[serde(rename = "H", alias = "H-Axis", alias = "h", default, deserialize_with = "lenient_value")]
    pub h: Option<T>,
    #[serde(rename = "V", alias = "V-Axis", alias = "v", default, deserialize_with = "lenient_value")]
    pub v: Option<T>,
    #[serde(rename = "A", alias = "A-Axis", alias = "a", default, deserialize_with = "lenient_value")]
    pub a: Option<T>,
}

impl<T> Default for PerAxis<T> {
    fn default() -> Self {
        Self { h: None, v: None, a: None }
    }
}

impl<T> PerAxis<T> {
    pub fn get(&self, axis: Axis) -> Option<&T> {
        match axis {
            Axis::Horizontal => self.h.as_ref(),
            Axis::Vertical => self.v.as_ref(),
            Axis::Axial => self.a.as_ref(),
        }
    }

    pub fn set(&mut self, axis: Axis, value: T) {
        match axis {
            Axis::Horizontal => self.h = Some(value),
            Axis::Vertical => self.v = Some(value),
            Axis::Axial => self.a = Some(value),
        }
    }
}

/// Overall vibration readings for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct AxisMetrics {
    /// Velocity, mm/s rms
    #[serde(default)]
    pub velocity: f64,
    /// Acceleration, g rms
    #[serde(default)]
    pub acceleration: f64,
    /// Acceleration envelope, gE
    #[serde(default)]
    pub envelope: f64,
}

/// Time-domain capture for one axis.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Waveform {
    #[serde(default)]
    pub sample_rate: f64,
    #[serde(default)]
    pub samples: Vec<f64>,
}

/// Where a value shown in the report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provenance {
    Measured,
    Synthetic,
}

// ============================================================================
// Spectrum series
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SpectrumPoint {
    pub frequency: f64,
    pub amplitude: f64,
}

/// Frequency-domain amplitudes for one axis of one bearing.
///
/// Invariants: frequencies strictly increasing within `0..=FREQUENCY_MAX_HZ`,
/// amplitudes finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumSeries {
    axis: Axis,
    points: Vec<SpectrumPoint>,
}

impl SpectrumSeries {
    /// Build a series, repairing input that breaks the invariants: negative or
    /// non-finite amplitudes clamp to zero, points outside the domain or not
    /// strictly after their predecessor are dropped.
    pub fn new(axis: Axis, points: impl IntoIterator<Item = SpectrumPoint>) -> Self {
        let mut kept: Vec<SpectrumPoint> = Vec::new();
        for p in points {
            if !p.frequency.is_finite() || p.frequency < 0.0 || p.frequency > FREQUENCY_MAX_HZ {
                continue;
            }
            if let Some(last) = kept.last() {
                if p.frequency <= last.frequency {
                    continue;
                }
            }
            let amplitude = if p.amplitude.is_finite() { p.amplitude.max(0.0) } else { 0.0 };
            kept.push(SpectrumPoint { frequency: p.frequency, amplitude });
        }
        Self { axis, points: kept }
    }

    pub fn empty(axis: Axis) -> Self {
        Self { axis, points: Vec::new() }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn points(&self) -> &[SpectrumPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Largest amplitude, or 0.0 for an empty series
    pub fn max_amplitude(&self) -> f64 {
        self.points.iter().map(|p| p.amplitude).fold(0.0, f64::max)
    }

    /// Frequency of the largest amplitude
    pub fn peak_frequency(&self) -> Option<f64> {
        self.points
            .iter()
            .fold(None::<&SpectrumPoint>, |best, p| match best {
                Some(b) if b.amplitude >= p.amplitude => Some(b),
                _ => Some(p),
            })
            .map(|p| p.frequency)
    }
}

// ============================================================================
// Lenient deserializers
// ============================================================================

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("$oid").and_then(|v| v.as_str()).map(str::to_string),
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_value<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // RECORD PARSING TESTS
    // ==========================================================================
    //
    // Records come from two endpoints with different field names. Every
    // field is optional and nothing here may fail on shape mismatches.
    // ==========================================================================

    #[test]
    fn test_machine_aliases() {
        let m = MachineRecord::from_json(
            r#"{"_id": "abc", "machineName": "Fan 3", "statusName": "Alert", "subareaId": "S1"}"#,
        )
        .unwrap();
        assert_eq!(m.id(), Some("abc"));
        assert_eq!(m.display_name(), Some("Fan 3"));
        assert_eq!(m.status_label(), Some("Alert"));
        assert_eq!(m.sub_area(), Some("S1"));
    }

    #[test]
    fn test_machine_prefers_primary_fields() {
        let m = MachineRecord::from_json(
            r#"{"_id": "obj", "machineId": "M1", "status": "normal", "statusName": "alert"}"#,
        )
        .unwrap();
        assert_eq!(m.id(), Some("M1"));
        assert_eq!(m.status_label(), Some("normal"));
    }

    #[test]
    fn test_machine_envelope() {
        let m = MachineRecord::from_json(
            r#"{"machine": {"machineId": "M9", "bearings": [{"_id": "B1"}, {"bearingId": "B2"}]}}"#,
        )
        .unwrap();
        assert_eq!(m.id(), Some("M9"));
        assert_eq!(m.bearings.len(), 2);
        assert_eq!(m.bearings[0].id(), "B1");
        assert_eq!(m.bearings[1].id(), "B2");
    }

    #[test]
    fn test_machine_wrong_shapes_degrade() {
        let m = MachineRecord::from_json(
            r#"{"machineId": 42, "_id": {"$oid": "65f0"}, "name": null, "customerId": [1], "bearings": "none"}"#,
        )
        .unwrap();
        assert_eq!(m.id(), Some("42"));
        assert_eq!(m.object_id.as_deref(), Some("65f0"));
        assert_eq!(m.display_name(), None);
        assert_eq!(m.customer_id, None);
        assert!(m.bearings.is_empty());
        assert_eq!(m.title(), "42");
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let m = MachineRecord::from_json(r#"{"name": "  ", "machineName": "Pump"}"#).unwrap();
        assert_eq!(m.display_name(), Some("Pump"));
        assert_eq!(MachineRecord::default().title(), "machine");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(MachineRecord::from_json("{not json").is_err());
    }

    #[test]
    fn test_bearing_measurements() {
        let m = MachineRecord::from_json(
            r#"{"bearings": [{
                "_id": "B1",
                "fftData": [{"frequency": 1, "amplitude": 1.0}],
                "spectra": {"H-Axis": [{"frequency": 10, "amplitude": 0.5}]},
                "rowdata": {"A": {"sampleRate": 2048, "samples": [0.0, 1.0]}},
                "metrics": {"V": {"velocity": 3.2, "acceleration": 0.4, "envelope": 0.1}}
            }]}"#,
        )
        .unwrap();
        let b = &m.bearings[0];
        assert_eq!(b.fft_data.len(), 1);
        assert_eq!(b.spectra.get(Axis::Horizontal).map(|s| s.len()), Some(1));
        assert_eq!(b.waveform(Axis::Axial).map(|w| w.sample_rate), Some(2048.0));
        assert_eq!(b.metrics.get(Axis::Vertical).map(|m| m.velocity), Some(3.2));
        assert!(b.metrics.get(Axis::Horizontal).is_none());
    }

    #[test]
    fn test_bearing_malformed_measurements_ignored() {
        let m = MachineRecord::from_json(
            r#"{"bearings": [{"bearingId": "B1", "spectra": 5, "metrics": {"H": "fast"}}]}"#,
        )
        .unwrap();
        let b = &m.bearings[0];
        assert!(b.spectra.get(Axis::Horizontal).is_none());
        assert!(b.metrics.get(Axis::Horizontal).is_none());
    }

    #[test]
    fn test_bearing_label_falls_back_to_id() {
        let mut b = BearingRecord { bearing_id: Some("B7".into()), ..Default::default() };
        assert_eq!(b.label(), "B7");
        b.name = Some("Motor DE".into());
        assert_eq!(b.label(), "Motor DE");
        assert_eq!(BearingRecord::default().id(), NOT_AVAILABLE);
    }

    // ==========================================================================
    // SPECTRUM SERIES TESTS
    // ==========================================================================

    fn pt(frequency: f64, amplitude: f64) -> SpectrumPoint {
        SpectrumPoint { frequency, amplitude }
    }

    #[test]
    fn test_series_repairs_invariants() {
        let s = SpectrumSeries::new(
            Axis::Vertical,
            vec![
                pt(0.0, 1.0),
                pt(10.0, -2.0),
                pt(10.0, 3.0),
                pt(5.0, 3.0),
                pt(20.0, f64::NAN),
                pt(1200.0, 4.0),
                pt(1000.0, 2.0),
            ],
        );
        let freqs: Vec<f64> = s.points().iter().map(|p| p.frequency).collect();
        assert_eq!(freqs, vec![0.0, 10.0, 20.0, 1000.0]);
        assert_eq!(s.points()[1].amplitude, 0.0);
        assert_eq!(s.points()[2].amplitude, 0.0);
        assert_eq!(s.max_amplitude(), 2.0);
        assert_eq!(s.peak_frequency(), Some(1000.0));
    }

    #[test]
    fn test_series_empty() {
        let s = SpectrumSeries::empty(Axis::Axial);
        assert!(s.is_empty());
        assert_eq!(s.max_amplitude(), 0.0);
        assert_eq!(s.peak_frequency(), None);
    }
}
