//! Filter-Slope Cascade
//!
//! A low-cut or high-cut filter built from a fixed bank of four biquads.
//! The selected slope decides how many of them are active (12 dB/oct each);
//! the rest are set to identity so the per-sample loop always runs all four
//! stages and nothing is resized on the audio thread.

use crate::dsp::biquad::{Biquad, FilterCoefficients};
use crate::dsp::coefficients::{butterworth_q, high_cut_stage, low_cut_stage};
use crate::dsp::consts::{DB_PER_OCTAVE_PER_STAGE, MAX_CUT_STAGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// High-pass response, removes content below the cutoff.
    LowCut,
    /// Low-pass response, removes content above the cutoff.
    HighCut,
}

/// Designed coefficients for one cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    pub stages: [FilterCoefficients; MAX_CUT_STAGES],
    pub active_stages: usize,
}

impl Default for CutCoefficients {
    fn default() -> Self {
        Self {
            stages: [FilterCoefficients::IDENTITY; MAX_CUT_STAGES],
            active_stages: 0,
        }
    }
}

impl CutCoefficients {
    /// Butterworth cut of order `2 * (slope_index + 1)` at `cutoff`.
    ///
    /// `slope_index` above 3 is treated as 3.
    pub fn design(kind: CutKind, cutoff: f32, slope_index: usize, sample_rate: f32) -> Self {
        let active_stages = slope_index.min(MAX_CUT_STAGES - 1) + 1;
        let order = 2 * active_stages;

        let mut stages = [FilterCoefficients::IDENTITY; MAX_CUT_STAGES];
        for (i, stage) in stages.iter_mut().enumerate().take(active_stages) {
            let q = butterworth_q(order, i);
            *stage = match kind {
                CutKind::LowCut => low_cut_stage(cutoff, q, sample_rate),
                CutKind::HighCut => high_cut_stage(cutoff, q, sample_rate),
            };
        }

        Self {
            stages,
            active_stages,
        }
    }

    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        self.stages
            .iter()
            .map(|c| c.magnitude_at(freq, sample_rate))
            .product()
    }

    /// Nominal roll-off of the active stages.
    pub fn db_per_octave(&self) -> f32 {
        self.active_stages as f32 * DB_PER_OCTAVE_PER_STAGE
    }
}

pub struct CutFilter {
    kind: CutKind,
    stages: [Biquad; MAX_CUT_STAGES],
    active_stages: usize,
}

impl CutFilter {
    pub fn new(kind: CutKind) -> Self {
        Self {
            kind,
            stages: [Biquad::new(); MAX_CUT_STAGES],
            active_stages: 0,
        }
    }

    pub fn kind(&self) -> CutKind {
        self.kind
    }

    /// Design and load coefficients for `cutoff` at the given slope.
    pub fn configure(&mut self, cutoff: f32, slope_index: usize, sample_rate: f32) {
        let coeffs = CutCoefficients::design(self.kind, cutoff, slope_index, sample_rate);
        self.apply(&coeffs);
    }

    /// Load a precomputed set. Stages beyond `active_stages` receive identity.
    #[inline]
    pub fn apply(&mut self, coeffs: &CutCoefficients) {
        for (stage, c) in self.stages.iter_mut().zip(coeffs.stages.iter()) {
            stage.update_coefficients(*c);
        }
        self.active_stages = coeffs.active_stages;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(input, |sample, stage| stage.process(sample))
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    pub fn active_stages(&self) -> usize {
        self.active_stages
    }

    pub fn coefficients(&self) -> CutCoefficients {
        let mut stages = [FilterCoefficients::IDENTITY; MAX_CUT_STAGES];
        for (dst, stage) in stages.iter_mut().zip(self.stages.iter()) {
            *dst = stage.coefficients();
        }
        CutCoefficients {
            stages,
            active_stages: self.active_stages,
        }
    }

    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        self.stages
            .iter()
            .map(|s| s.magnitude_at(freq, sample_rate))
            .product()
    }
}
