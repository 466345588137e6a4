//! Biquad Filter Stage (IIR 2nd Order)
//!
//! A single second-order recursive section. Every stage of the EQ chain,
//! cut cascades and peak alike, is one of these.
//!
//! # Design Notes
//! - Coefficients are a plain value type ([`FilterCoefficients`]) produced by the
//!   design functions in [`crate::dsp::coefficients`]; the stage only runs them
//! - Transposed direct form II, two state values
//! - All operations are safe for the audio thread (no allocations)

use std::f64::consts::PI;

/// Normalized biquad coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for FilterCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FilterCoefficients {
    /// Pass-through response.
    pub const IDENTITY: FilterCoefficients = FilterCoefficients {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Linear magnitude of the transfer function at `freq`.
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        if sample_rate <= 0.0 {
            return 1.0;
        }

        let w = 2.0 * PI * f64::from(freq) / f64::from(sample_rate);
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let (b0, b1, b2) = (
            f64::from(self.b0),
            f64::from(self.b1),
            f64::from(self.b2),
        );
        let (a1, a2) = (f64::from(self.a1), f64::from(self.a2));

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);

        let den = (den_re * den_re + den_im * den_im).sqrt().max(1e-300);
        (num_re * num_re + num_im * num_im).sqrt() / den
    }

    /// Poles strictly inside the unit circle (Jury conditions for a 2nd order denominator).
    pub fn is_stable(&self) -> bool {
        let (a1, a2) = (f64::from(self.a1), f64::from(self.a2));
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }
}

/// Biquad filter implementation (IIR 2nd order)
#[derive(Debug, Clone, Copy, Default)]
pub struct Biquad {
    coeffs: FilterCoefficients,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new() -> Self {
        Self {
            coeffs: FilterCoefficients::IDENTITY,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Process a single sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let out = input * c.b0 + self.z1;

        // Anti-denormal: tiny DC offset
        self.z1 = input * c.b1 + self.z2 - c.a1 * out + 1e-25;
        self.z2 = input * c.b2 - c.a2 * out + 1e-25;

        out
    }

    /// Replace all five coefficients at once.
    ///
    /// Filter history is kept, so a parameter sweep does not click.
    #[inline]
    pub fn update_coefficients(&mut self, coeffs: FilterCoefficients) {
        self.coeffs = coeffs;
    }

    #[inline]
    pub fn coefficients(&self) -> FilterCoefficients {
        self.coeffs
    }

    /// Clear filter delay state.
    ///
    /// Not called by coefficient updates; only on sample rate change or stream restart.
    #[inline]
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        self.coeffs.magnitude_at(freq, sample_rate)
    }
}
