//! Coefficient designers (RBJ audio-EQ cookbook)
//!
//! Free functions that turn user-facing values into a [`FilterCoefficients`]
//! value. One function per filter kind; none of them touch filter state, so
//! the same inputs always produce bit-identical output.
//!
//! Design math runs in `f64` and is rounded to `f32` once at the end.

use std::f64::consts::PI;

use crate::dsp::biquad::FilterCoefficients;
use crate::dsp::consts::{
    FLAT_GAIN_EPS_DB, MAX_GAIN_DB, MIN_FREQUENCY_HZ, MIN_QUALITY, NYQUIST_GUARD_RATIO,
};

// ---------------------------------------------------------------------
// Input clamping
// ---------------------------------------------------------------------

/// Clamp a design frequency into `[20 Hz, 0.49 * sample_rate]`.
///
/// The Nyquist guard wins: below a 40.8 Hz sample rate every frequency
/// lands on `0.49 * sample_rate`.
#[inline]
pub fn clamp_frequency(freq: f32, sample_rate: f32) -> f32 {
    let upper = sample_rate * NYQUIST_GUARD_RATIO;
    let lower = MIN_FREQUENCY_HZ.min(upper);
    if freq.is_nan() {
        return lower;
    }
    freq.clamp(lower, upper)
}

#[inline]
pub fn clamp_quality(q: f32) -> f32 {
    if q.is_nan() {
        return MIN_QUALITY;
    }
    q.max(MIN_QUALITY)
}

#[inline]
pub fn clamp_gain_db(gain_db: f32) -> f32 {
    if gain_db.is_nan() {
        return 0.0;
    }
    gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB)
}

/// Quality of section `stage` in an even-order Butterworth realized as biquads.
///
/// The section Qs come from the pole angles `(2k + 1) * pi / (2 * order)`. Their
/// product is `1 / sqrt(2)`, which is what puts the whole cascade's -3 dB point on
/// the design frequency instead of stacking -3 dB per section.
pub fn butterworth_q(order: usize, stage: usize) -> f32 {
    let order = order.max(2) as f64;
    let theta = PI * (2.0 * stage as f64 + 1.0) / (2.0 * order);
    (1.0 / (2.0 * theta.cos())) as f32
}

struct Prewarped {
    cos_w0: f64,
    alpha: f64,
}

fn prewarp(freq: f32, q: f32, sample_rate: f32) -> Prewarped {
    let freq = clamp_frequency(freq, sample_rate);
    let q = clamp_quality(q);
    let w0 = 2.0 * PI * f64::from(freq) / f64::from(sample_rate);
    Prewarped {
        cos_w0: w0.cos(),
        alpha: w0.sin() / (2.0 * f64::from(q)),
    }
}

// ---------------------------------------------------------------------
// Filter kinds
// ---------------------------------------------------------------------

/// Peaking (bell) EQ. At `freq` the response equals `gain_db`.
pub fn peak(freq: f32, q: f32, gain_db: f32, sample_rate: f32) -> FilterCoefficients {
    let gain_db = clamp_gain_db(gain_db);
    if sample_rate <= 0.0 || gain_db.abs() < FLAT_GAIN_EPS_DB {
        return FilterCoefficients::IDENTITY;
    }

    let a = 10.0_f64.powf(f64::from(gain_db) / 40.0);
    let Prewarped { cos_w0, alpha } = prewarp(freq, q, sample_rate);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_w0;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha / a;

    let inv_a0 = 1.0 / a0;

    FilterCoefficients {
        b0: (b0 * inv_a0) as f32,
        b1: (b1 * inv_a0) as f32,
        b2: (b2 * inv_a0) as f32,
        a1: (a1 * inv_a0) as f32,
        a2: (a2 * inv_a0) as f32,
    }
}

/// One high-pass section of a low-cut cascade.
pub fn low_cut_stage(freq: f32, q: f32, sample_rate: f32) -> FilterCoefficients {
    if sample_rate <= 0.0 {
        return FilterCoefficients::IDENTITY;
    }

    let Prewarped { cos_w0, alpha } = prewarp(freq, q, sample_rate);
    let inv_a0 = 1.0 / (1.0 + alpha);

    // b1 and b2 derive from the rounded b0 so the double zero sits exactly at DC
    let b0 = (((1.0 + cos_w0) * 0.5) * inv_a0) as f32;

    FilterCoefficients {
        b0,
        b1: -2.0 * b0,
        b2: b0,
        a1: ((-2.0 * cos_w0) * inv_a0) as f32,
        a2: ((1.0 - alpha) * inv_a0) as f32,
    }
}

/// One low-pass section of a high-cut cascade.
pub fn high_cut_stage(freq: f32, q: f32, sample_rate: f32) -> FilterCoefficients {
    if sample_rate <= 0.0 {
        return FilterCoefficients::IDENTITY;
    }

    let Prewarped { cos_w0, alpha } = prewarp(freq, q, sample_rate);
    let inv_a0 = 1.0 / (1.0 + alpha);

    let b0 = (((1.0 - cos_w0) * 0.5) * inv_a0) as f32;

    FilterCoefficients {
        b0,
        b1: 2.0 * b0,
        b2: b0,
        a1: ((-2.0 * cos_w0) * inv_a0) as f32,
        a2: ((1.0 - alpha) * inv_a0) as f32,
    }
}
