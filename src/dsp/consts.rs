//! Filter design limits shared by the parameter layout and the coefficient designers.

/// Lowest frequency any stage is designed at (Hz).
pub const MIN_FREQUENCY_HZ: f32 = 20.0;

/// Top of the user-facing frequency range (Hz).
pub const MAX_FREQUENCY_HZ: f32 = 20000.0;

/// Design frequencies are kept below this fraction of the sample rate.
/// 0.49 keeps `w0` clear of pi, where the bilinear sections degenerate.
pub const NYQUIST_GUARD_RATIO: f32 = 0.49;

/// Smallest quality factor handed to a design formula.
pub const MIN_QUALITY: f32 = 0.1;
pub const MAX_QUALITY: f32 = 10.0;

pub const MAX_GAIN_DB: f32 = 24.0;

/// Peak gains closer to 0 dB than this design as identity.
pub const FLAT_GAIN_EPS_DB: f32 = 0.01;

/// Number of biquads in a cut cascade, i.e. the 48 dB/oct maximum.
pub const MAX_CUT_STAGES: usize = 4;

/// Attenuation added by each active cascade stage.
pub const DB_PER_OCTAVE_PER_STAGE: f32 = 12.0;
