//! Fixed narrative text selected by severity

use crate::severity::SeverityLevel;

pub struct NarrativeSet {
    pub observation: &'static str,
    pub recommendation: &'static str,
}

const NARRATIVES: [NarrativeSet; 4] = [
    NarrativeSet {
        observation: "Overall vibration levels are low and consistent with a healthy machine. \
                      No dominant fault frequencies are visible in the measured spectra.",
        recommendation: "Continue routine condition monitoring at the current interval. \
                         No maintenance action is required.",
    },
    NarrativeSet {
        observation: "Vibration levels are slightly elevated but remain acceptable for \
                      unrestricted long-term operation. Running-speed components dominate the spectra.",
        recommendation: "Continue operation and keep the monitoring interval. Review the trend \
                         at the next scheduled inspection and check mounting bolts and alignment.",
    },
    NarrativeSet {
        observation: "Vibration levels exceed the limit for long-term continuous operation. \
                      Spectra show raised running-speed harmonics that indicate developing \
                      unbalance, misalignment or looseness.",
        recommendation: "Plan corrective maintenance at the next opportunity. Inspect alignment, \
                         balance and foundation, verify lubrication and shorten the monitoring interval.",
    },
    NarrativeSet {
        observation: "Vibration levels are severe enough to damage the machine. High-amplitude \
                      components across the spectrum indicate an advanced mechanical fault.",
        recommendation: "Stop the machine as soon as operations allow and carry out a detailed \
                         inspection of bearings, coupling and foundation before restarting.",
    },
];

pub fn narrative(level: SeverityLevel) -> &'static NarrativeSet {
    &NARRATIVES[level.rank() as usize - 1]
}
