//! EQ Chain
//!
//! Low-cut cascade → peak → high-cut cascade, in that fixed order. One chain
//! per audio channel; both channels load the same [`ChainCoefficients`] but
//! keep their own filter history.

use crate::dsp::biquad::{Biquad, FilterCoefficients};
use crate::dsp::cascade::{CutCoefficients, CutFilter, CutKind};
use crate::dsp::coefficients::peak;
use crate::dsp::settings::ChannelSettings;

/// Everything one chain needs for a block, designed from a settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub low_cut: CutCoefficients,
    pub peak: FilterCoefficients,
    pub high_cut: CutCoefficients,
    pub sample_rate: f32,
}

impl ChainCoefficients {
    /// Pure function of its inputs: equal settings give bit-identical output.
    pub fn design(settings: &ChannelSettings, sample_rate: f32) -> Self {
        Self {
            low_cut: CutCoefficients::design(
                CutKind::LowCut,
                settings.low_cut_freq,
                settings.low_cut_slope.index(),
                sample_rate,
            ),
            peak: peak(
                settings.peak_freq,
                settings.peak_quality,
                settings.peak_gain_db,
                sample_rate,
            ),
            high_cut: CutCoefficients::design(
                CutKind::HighCut,
                settings.high_cut_freq,
                settings.high_cut_slope.index(),
                sample_rate,
            ),
            sample_rate,
        }
    }

    pub fn magnitude_at(&self, freq: f32) -> f64 {
        self.low_cut.magnitude_at(freq, self.sample_rate)
            * self.peak.magnitude_at(freq, self.sample_rate)
            * self.high_cut.magnitude_at(freq, self.sample_rate)
    }

    /// Whole-chain response in dB, floored at -200 dB.
    pub fn magnitude_db_at(&self, freq: f32) -> f64 {
        20.0 * self.magnitude_at(freq).max(1e-10).log10()
    }
}

pub struct EqChain {
    low_cut: CutFilter,
    peak: Biquad,
    high_cut: CutFilter,
    sample_rate: f32,
}

impl Default for EqChain {
    fn default() -> Self {
        Self::new()
    }
}

impl EqChain {
    pub fn new() -> Self {
        Self {
            low_cut: CutFilter::new(CutKind::LowCut),
            peak: Biquad::new(),
            high_cut: CutFilter::new(CutKind::HighCut),
            sample_rate: 0.0,
        }
    }

    /// Design and load coefficients for `settings`.
    pub fn update_from_settings(&mut self, settings: &ChannelSettings, sample_rate: f32) {
        self.apply(&ChainCoefficients::design(settings, sample_rate));
    }

    /// Load a precomputed coefficient set into all three positions.
    #[inline]
    pub fn apply(&mut self, coeffs: &ChainCoefficients) {
        self.low_cut.apply(&coeffs.low_cut);
        self.peak.update_coefficients(coeffs.peak);
        self.high_cut.apply(&coeffs.high_cut);
        self.sample_rate = coeffs.sample_rate;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let x = self.low_cut.process(input);
        let x = self.peak.process(x);
        self.high_cut.process(x)
    }

    pub fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }

    /// Coefficients currently loaded, as a value.
    pub fn coefficients(&self) -> ChainCoefficients {
        ChainCoefficients {
            low_cut: self.low_cut.coefficients(),
            peak: self.peak.coefficients(),
            high_cut: self.high_cut.coefficients(),
            sample_rate: self.sample_rate,
        }
    }

    pub fn magnitude_db_at(&self, freq: f32) -> f64 {
        self.coefficients().magnitude_db_at(freq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::settings::Slope;

    const SR: f32 = 48000.0;

    fn flat() -> ChannelSettings {
        ChannelSettings::default()
    }

    #[test]
    fn test_peak_gain_at_center_and_flat_far_away() {
        for &(freq, gain, q) in &[
            (750.0, 6.0, 1.0),
            (200.0, -9.5, 2.0),
            (3000.0, 24.0, 0.7),
            (8000.0, -24.0, 8.0),
        ] {
            let settings = ChannelSettings {
                peak_freq: freq,
                peak_gain_db: gain,
                peak_quality: q,
                ..flat()
            };
            let mut chain = EqChain::new();
            chain.update_from_settings(&settings, SR);

            let at_peak = chain.magnitude_db_at(freq);
            assert!(
                (at_peak - f64::from(gain)).abs() < 0.1,
                "{freq} Hz: {at_peak} dB"
            );

            // Six octaves away the bell has no say; only the 20 Hz / 20 kHz cuts remain
            let far = if freq > 300.0 { freq / 64.0 } else { freq * 64.0 };
            let cuts_only = ChainCoefficients::design(&flat(), SR).magnitude_db_at(far);
            let at_far = chain.magnitude_db_at(far);
            assert!((at_far - cuts_only).abs() < 0.5, "{far} Hz: {at_far} dB");
        }
    }

    #[test]
    fn test_low_cut_24db_scenario() {
        let settings = ChannelSettings {
            low_cut_freq: 100.0,
            low_cut_slope: Slope::Db24,
            ..flat()
        };
        let coeffs = ChainCoefficients::design(&settings, SR);
        let passband = coeffs.magnitude_db_at(1000.0);

        assert!((coeffs.magnitude_db_at(400.0) - passband).abs() < 0.1);
        assert!((coeffs.magnitude_db_at(100.0) - passband + 3.01).abs() < 0.1);

        // One octave down is the nominal slope, two octaves down is at least that
        let one_octave = passband - coeffs.magnitude_db_at(50.0);
        assert!((one_octave - 24.0).abs() < 1.0, "{one_octave}");
        let two_octaves = passband - coeffs.magnitude_db_at(25.0);
        assert!(two_octaves > 24.0, "{two_octaves}");
    }

    #[test]
    fn test_update_is_idempotent() {
        let settings = ChannelSettings {
            low_cut_freq: 87.0,
            high_cut_freq: 9100.0,
            peak_freq: 1234.0,
            peak_gain_db: -7.5,
            peak_quality: 3.3,
            low_cut_slope: Slope::Db48,
            high_cut_slope: Slope::Db36,
        };

        let mut chain = EqChain::new();
        chain.update_from_settings(&settings, 44100.0);
        let first = chain.coefficients();
        chain.update_from_settings(&settings, 44100.0);
        let second = chain.coefficients();

        assert_eq!(first, second);
        assert_eq!(first, ChainCoefficients::design(&settings, 44100.0));
    }

    #[test]
    fn test_impulse_and_noise_stay_bounded() {
        let extremes = [
            ChannelSettings {
                low_cut_freq: 20.0,
                high_cut_freq: 20000.0,
                peak_freq: 20.0,
                peak_gain_db: 24.0,
                peak_quality: 10.0,
                low_cut_slope: Slope::Db48,
                high_cut_slope: Slope::Db48,
            },
            ChannelSettings {
                low_cut_freq: 20000.0,
                high_cut_freq: 20.0,
                peak_freq: 20000.0,
                peak_gain_db: -24.0,
                peak_quality: 0.1,
                low_cut_slope: Slope::Db12,
                high_cut_slope: Slope::Db48,
            },
            ChannelSettings {
                peak_freq: 15000.0,
                peak_gain_db: 24.0,
                peak_quality: 0.1,
                ..flat()
            },
        ];

        for settings in &extremes {
            for &sr in &[44100.0, 48000.0, 96000.0] {
                let mut chain = EqChain::new();
                chain.update_from_settings(settings, sr);

                let mut peak = 0.0f32;
                let mut tail = 0.0f32;
                let mut seed = 0x1234_5678u32;
                let n = 200_000usize;
                for i in 0..n {
                    // Impulse, then white noise from a small LCG
                    let x = if i == 0 {
                        1.0
                    } else if i > n / 2 {
                        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                        (seed >> 8) as f32 / (1u32 << 23) as f32 - 1.0
                    } else {
                        0.0
                    };
                    let y = chain.process(x);
                    assert!(y.is_finite());
                    peak = peak.max(y.abs());
                    if i > n / 2 - 1000 && i <= n / 2 {
                        tail = tail.max(y.abs());
                    }
                }
                assert!(peak < 1000.0, "diverged: {peak}");
                // Impulse response has died out before the noise starts
                assert!(tail < 1e-2, "ringing: {tail}");
            }
        }
    }

    #[test]
    fn test_every_section_stable_at_low_sample_rates() {
        let settings = [
            flat(),
            ChannelSettings {
                peak_gain_db: 6.0,
                low_cut_slope: Slope::Db48,
                high_cut_slope: Slope::Db48,
                ..flat()
            },
            ChannelSettings {
                low_cut_freq: 20000.0,
                high_cut_freq: 20.0,
                peak_freq: 20.0,
                peak_gain_db: 24.0,
                peak_quality: 10.0,
                low_cut_slope: Slope::Db48,
                high_cut_slope: Slope::Db48,
            },
        ];
        let rates = [
            1.0, 5.0, 10.0, 20.0, 30.0, 39.0, 40.0, 40.8, 41.0, 60.0, 81.6, 100.0, 200.0, 1000.0,
            8000.0,
        ];

        for settings in &settings {
            for &sr in &rates {
                let coeffs = ChainCoefficients::design(settings, sr);
                let sections = coeffs
                    .low_cut
                    .stages
                    .iter()
                    .chain(std::iter::once(&coeffs.peak))
                    .chain(coeffs.high_cut.stages.iter());
                for (i, section) in sections.enumerate() {
                    assert!(section.is_stable(), "{sr} Hz, section {i}: {section:?}");
                }

                let mut chain = EqChain::new();
                chain.apply(&coeffs);
                let mut peak = 0.0f32;
                for n in 0..20_000 {
                    let y = chain.process(if n == 0 { 1.0 } else { 0.0 });
                    assert!(y.is_finite(), "{sr} Hz: non-finite output");
                    peak = peak.max(y.abs());
                }
                assert!(peak < 1000.0, "{sr} Hz: diverged to {peak}");
            }
        }
    }

    #[test]
    fn test_channels_keep_separate_history() {
        let settings = ChannelSettings {
            low_cut_freq: 500.0,
            low_cut_slope: Slope::Db36,
            ..flat()
        };
        let coeffs = ChainCoefficients::design(&settings, SR);
        let mut left = EqChain::new();
        let mut right = EqChain::new();
        left.apply(&coeffs);
        right.apply(&coeffs);

        left.process(1.0);
        let left_ring = left.process(0.0);
        let right_silent = right.process(0.0);

        assert!(left_ring.abs() > 1e-4);
        assert!(right_silent.abs() < 1e-6);
        assert_eq!(left.coefficients(), right.coefficients());
    }
}
