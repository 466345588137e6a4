//! Spectrum display pipeline: audio-thread sampler plus the single-slot
//! handoff to the editor.

pub mod bridge;
pub mod sampler;

pub use bridge::{display_bridge, is_silent, SpectrumPublisher, SpectrumReader};
pub use sampler::SpectrumSampler;

pub mod consts {
    /// Transform length. 23.4 Hz bins at 48 kHz.
    pub const FFT_SIZE: usize = 2048;
    /// Samples between transforms (50% overlap).
    pub const HOP_SIZE: usize = 1024;
    /// Values in a published frame, DC through Nyquist.
    pub const SPECTRUM_BINS: usize = FFT_SIZE / 2 + 1;

    pub const MIN_DB: f32 = -100.0;
    pub const MAX_DB: f32 = 0.0;

    /// Lowest frequency shown on the display.
    pub const MIN_DISPLAY_HZ: f32 = 20.0;

    /// Normalized magnitudes under this count as silence.
    pub const SILENCE_THRESHOLD: f32 = 1e-3;
}

/// One published frame: a normalized magnitude in `[0, 1]` per FFT bin.
/// The editor places each bin on a log frequency axis.
pub type SpectrumFrame = [f32; consts::SPECTRUM_BINS];

/// Center frequency of FFT bin `bin`.
#[inline]
pub fn bin_frequency(bin: usize, sample_rate: f32) -> f32 {
    bin as f32 * sample_rate / consts::FFT_SIZE as f32
}

fn display_nyquist(sample_rate: f32) -> f32 {
    (sample_rate * 0.5).max(consts::MIN_DISPLAY_HZ * 2.0)
}

/// Log position of `freq` across the display, 0 at 20 Hz and 1 at Nyquist.
pub fn frequency_to_position(freq: f32, sample_rate: f32) -> f32 {
    let nyquist = display_nyquist(sample_rate);
    let freq = freq.max(consts::MIN_DISPLAY_HZ);
    ((freq / consts::MIN_DISPLAY_HZ).ln() / (nyquist / consts::MIN_DISPLAY_HZ).ln()).clamp(0.0, 1.0)
}

/// Inverse of [`frequency_to_position`].
pub fn position_to_frequency(position: f32, sample_rate: f32) -> f32 {
    let nyquist = display_nyquist(sample_rate);
    consts::MIN_DISPLAY_HZ * (nyquist / consts::MIN_DISPLAY_HZ).powf(position.clamp(0.0, 1.0))
}
