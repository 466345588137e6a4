use nih_plug::prelude::Enum;

use crate::dsp::consts::DB_PER_OCTAVE_PER_STAGE;
use crate::EqParams;

/// Cut filter slope choices exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[repr(usize)]
pub enum Slope {
    #[name = "12 dB/Oct"]
    Db12,
    #[name = "24 dB/Oct"]
    Db24,
    #[name = "36 dB/Oct"]
    Db36,
    #[name = "48 dB/Oct"]
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Cascade index, 0..=3.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Out of range indices clamp to the steepest slope.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn db_per_octave(self) -> f32 {
        (self.index() + 1) as f32 * DB_PER_OCTAVE_PER_STAGE
    }
}

/// Snapshot of the EQ parameters for one processing block.
///
/// Built once at the top of `process` and shared by both channels, so a block
/// never sees a half-updated parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSettings {
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
        }
    }
}

impl ChannelSettings {
    /// Read the live parameter values. No validation; the designers clamp.
    pub fn from_params(params: &EqParams) -> Self {
        Self {
            low_cut_freq: params.low_cut_freq.value(),
            high_cut_freq: params.high_cut_freq.value(),
            peak_freq: params.peak_freq.value(),
            peak_gain_db: params.peak_gain.value(),
            peak_quality: params.peak_quality.value(),
            low_cut_slope: params.low_cut_slope.value(),
            high_cut_slope: params.high_cut_slope.value(),
        }
    }
}
