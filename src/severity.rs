//! Severity classification and the shared color/threshold tables
//!
//! Every colored element in a report (status badges, table cells, the ISO
//! reference grid, the legend) reads from the tables in this module so the
//! renderer variants can never drift apart.
//!
//! # Severity Levels
//!
//! | Level | Name | Color | Velocity (mm/s rms) |
//! |-------|--------------|-------------|---------------------|
//! | 1 | Normal | green | ≤ 2.8 |
//! | 2 | Satisfactory | light green | 2.8 - 4.5 |
//! | 3 | Alert | amber | 4.5 - 7.1 |
//! | 4 | Unacceptable | red | > 7.1 |
//!
//! Labels come from an upstream service and are free text, so classification
//! fails open: anything unrecognized (including an empty or missing label) is
//! treated as Normal.

use serde::Serialize;
use std::fmt;

/// Version of the lookup tables below. Bump when a color or boundary changes.
pub const TABLE_VERSION: u32 = 2;

/// An sRGB color triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// `#rrggbb` form used by the HTML/SVG writer
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Discrete vibration-health classification of a machine or bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SeverityLevel {
    Normal = 1,
    Satisfactory = 2,
    Alert = 3,
    Unacceptable = 4,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 4] = [
        SeverityLevel::Normal,
        SeverityLevel::Satisfactory,
        SeverityLevel::Alert,
        SeverityLevel::Unacceptable,
    ];

    /// Ordinal value, 1 (Normal) through 4 (Unacceptable)
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            SeverityLevel::Normal => "Normal",
            SeverityLevel::Satisfactory => "Satisfactory",
            SeverityLevel::Alert => "Alert",
            SeverityLevel::Unacceptable => "Unacceptable",
        }
    }

    pub fn color(self) -> Rgb {
        SEVERITY_COLORS[self.index()]
    }

    pub fn description(self) -> &'static str {
        SEVERITY_DESCRIPTIONS[self.index()]
    }

    /// Bucket a velocity reading (mm/s rms) into a level.
    ///
    /// Boundaries are exclusive on the lower side: 2.8 is still Normal,
    /// 2.81 is Satisfactory.
    pub fn from_velocity(value: f64) -> SeverityLevel {
        if value > VELOCITY_LIMITS[2] {
            SeverityLevel::Unacceptable
        } else if value > VELOCITY_LIMITS[1] {
            SeverityLevel::Alert
        } else if value > VELOCITY_LIMITS[0] {
            SeverityLevel::Satisfactory
        } else {
            SeverityLevel::Normal
        }
    }

    fn index(self) -> usize {
        self as usize - 1
    }
}

impl Default for SeverityLevel {
    fn default() -> Self {
        SeverityLevel::Normal
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a free-text status label. Case and surrounding whitespace are
/// ignored; unknown labels map to Normal.
pub fn classify(label: &str) -> SeverityLevel {
    match label.trim().to_ascii_lowercase().as_str() {
        "satisfactory" => SeverityLevel::Satisfactory,
        "alert" => SeverityLevel::Alert,
        "unacceptable" | "unsatisfactory" => SeverityLevel::Unacceptable,
        _ => SeverityLevel::Normal,
    }
}

/// Same as [`classify`] for an optional label.
pub fn classify_opt(label: Option<&str>) -> SeverityLevel {
    label.map(classify).unwrap_or_default()
}

/// Cell color for a single velocity reading. Independent of the label
/// classifier; only table cells use it.
pub fn classify_velocity(value: f64) -> Rgb {
    SeverityLevel::from_velocity(value).color()
}

// ============================================================================
// Shared lookup tables
// ============================================================================

const SEVERITY_COLORS: [Rgb; 4] = [
    Rgb(0, 176, 80),
    Rgb(146, 208, 80),
    Rgb(255, 192, 0),
    Rgb(255, 0, 0),
];

const SEVERITY_DESCRIPTIONS: [&str; 4] = [
    "Vibration within the range of newly commissioned machines.",
    "Machines considered acceptable for unrestricted long-term operation.",
    "Machines considered unsatisfactory for long-term continuous operation. \
     Operate for a limited period until a suitable opportunity for remedial action.",
    "Vibration values of sufficient severity to cause damage to the machine.",
];

/// Satisfactory / Alert / Unacceptable lower limits for table cells (mm/s).
const VELOCITY_LIMITS: [f64; 3] = [2.8, 4.5, 7.1];

/// Machine groups of the ISO 10816-3 reference chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MachineGroup {
    /// Large machines, 300 kW - 50 MW
    Group1,
    /// Medium machines, 15 kW - 300 kW
    Group2,
    /// Pumps with separate driver, > 15 kW
    Group3,
    /// Pumps with integrated driver, > 15 kW
    Group4,
}

impl MachineGroup {
    pub const ALL: [MachineGroup; 4] = [
        MachineGroup::Group1,
        MachineGroup::Group2,
        MachineGroup::Group3,
        MachineGroup::Group4,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MachineGroup::Group1 => "Group 1",
            MachineGroup::Group2 => "Group 2",
            MachineGroup::Group3 => "Group 3",
            MachineGroup::Group4 => "Group 4",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MachineGroup::Group1 => "Large machines",
            MachineGroup::Group2 => "Medium machines",
            MachineGroup::Group3 => "Pumps, separate driver",
            MachineGroup::Group4 => "Pumps, integrated driver",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Foundation {
    Rigid,
    Flexible,
}

impl Foundation {
    pub fn label(self) -> &'static str {
        match self {
            Foundation::Rigid => "rigid",
            Foundation::Flexible => "flexible",
        }
    }
}

/// Upper edges (mm/s rms) of the eight velocity bands, lowest band first.
pub const VELOCITY_BANDS: [f64; 8] = [0.71, 1.4, 2.3, 2.8, 3.5, 4.5, 7.1, 11.0];

/// Zone boundaries A/B, B/C, C/D (mm/s rms) for a group and foundation.
pub fn zone_limits(group: MachineGroup, foundation: Foundation) -> [f64; 3] {
    use Foundation::*;
    use MachineGroup::*;
    match (group, foundation) {
        (Group1, Rigid) | (Group3, Rigid) => [2.3, 4.5, 7.1],
        (Group1, Flexible) | (Group3, Flexible) => [3.5, 7.1, 11.0],
        (Group2, Rigid) | (Group4, Rigid) => [1.4, 2.8, 4.5],
        (Group2, Flexible) | (Group4, Flexible) => [2.3, 4.5, 7.1],
    }
}

/// Severity of velocity band `band` (0 = lowest) for a group and foundation.
///
/// A band takes the zone its upper edge falls into; an edge equal to a
/// boundary stays in the lower zone.
pub fn band_severity(group: MachineGroup, foundation: Foundation, band: usize) -> SeverityLevel {
    let edge = VELOCITY_BANDS[band.min(VELOCITY_BANDS.len() - 1)];
    let exceeded = zone_limits(group, foundation)
        .iter()
        .filter(|&&limit| edge > limit)
        .count();
    SeverityLevel::ALL[exceeded]
}
