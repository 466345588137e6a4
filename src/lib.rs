mod debug;
pub mod dsp;
pub mod spectrum;
mod ui;

use crate::dsp::{ChannelSettings, CoefficientController, EqChain, Slope};
use crate::spectrum::{display_bridge, SpectrumReader, SpectrumSampler};
use nih_plug::prelude::*;
use nih_plug_vizia::{create_vizia_editor, ViziaState, ViziaTheming};
use std::sync::Arc;
use ui::build_ui;

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

// -----------------------------------------------------------------------------
// PARAMETERS
// -----------------------------------------------------------------------------
#[derive(Params)]
pub struct EqParams {
    #[persist = "editor-state"]
    pub editor_state: Arc<ViziaState>,

    #[id = "lowcut_freq"]
    pub low_cut_freq: FloatParam,

    #[id = "highcut_freq"]
    pub high_cut_freq: FloatParam,

    #[id = "peak_freq"]
    pub peak_freq: FloatParam,

    #[id = "peak_gain"]
    pub peak_gain: FloatParam,

    #[id = "peak_quality"]
    pub peak_quality: FloatParam,

    #[id = "lowcut_slope"]
    pub low_cut_slope: EnumParam<Slope>,

    #[id = "highcut_slope"]
    pub high_cut_slope: EnumParam<Slope>,
}

// "750 Hz" / "2.50 kHz". The unit is picked after rounding so 999.7 never shows as "1000 Hz".
fn format_hz(v: f32) -> String {
    if v.round() >= 1000.0 {
        format!("{:.2} kHz", v / 1000.0)
    } else {
        format!("{:.0} Hz", v)
    }
}

fn format_db(v: f32) -> String {
    format!("{:.1} dB", v)
}

fn format_quality(v: f32) -> String {
    format!("Q {:.2}", v)
}

fn frequency_param(name: &str, default: f32) -> FloatParam {
    FloatParam::new(
        name,
        default,
        FloatRange::Skewed {
            min: dsp::consts::MIN_FREQUENCY_HZ,
            max: dsp::consts::MAX_FREQUENCY_HZ,
            factor: 0.25,
        },
    )
    .with_step_size(1.0)
    .with_value_to_string(Arc::new(format_hz))
    .with_string_to_value(formatters::s2v_f32_hz_then_khz())
}

impl Default for EqParams {
    fn default() -> Self {
        Self {
            editor_state: ViziaState::new(|| (720, 520)),

            low_cut_freq: frequency_param("LowCut Freq", dsp::consts::MIN_FREQUENCY_HZ),
            high_cut_freq: frequency_param("HighCut Freq", dsp::consts::MAX_FREQUENCY_HZ),
            peak_freq: frequency_param("Peak Freq", 750.0),

            peak_gain: FloatParam::new(
                "Peak Gain",
                0.0,
                FloatRange::Linear {
                    min: -dsp::consts::MAX_GAIN_DB,
                    max: dsp::consts::MAX_GAIN_DB,
                },
            )
            .with_step_size(0.5)
            .with_value_to_string(Arc::new(format_db)),

            peak_quality: FloatParam::new(
                "Peak Quality",
                1.0,
                FloatRange::Linear {
                    min: dsp::consts::MIN_QUALITY,
                    max: dsp::consts::MAX_QUALITY,
                },
            )
            .with_step_size(0.05)
            .with_value_to_string(Arc::new(format_quality)),

            low_cut_slope: EnumParam::new("LowCut Slope", Slope::Db12),
            high_cut_slope: EnumParam::new("HighCut Slope", Slope::Db12),
        }
    }
}

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------
pub struct SimpleEq {
    params: Arc<EqParams>,

    /// Left, right. Mono layouts only use the first.
    chains: [EqChain; 2],
    controller: CoefficientController,

    sampler: SpectrumSampler,
    spectrum: SpectrumReader,
}

impl Default for SimpleEq {
    fn default() -> Self {
        let (publisher, spectrum) = display_bridge();
        Self {
            params: Arc::new(EqParams::default()),
            chains: [EqChain::new(), EqChain::new()],
            controller: CoefficientController::new(),
            sampler: SpectrumSampler::new(publisher, DEFAULT_SAMPLE_RATE),
            spectrum,
        }
    }
}

impl Plugin for SimpleEq {
    const NAME: &'static str = "Simple EQ";
    const VENDOR: &'static str = "SimpleEQ Developers";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        #[cfg(feature = "debug")]
        crate::debug::ring::init();

        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let sample_rate = buffer_config.sample_rate;
            let channels = audio_io_layout
                .main_output_channels
                .map(NonZeroU32::get)
                .unwrap_or(0);

            // An unusable rate leaves the controller uninitialized; audio then passes through
            if !self.prepare(sample_rate) {
                log::warn!("ignoring invalid sample rate {sample_rate}");
                return true;
            }

            log::debug!(
                "initialized: {sample_rate} Hz, {channels} ch, max block {}",
                buffer_config.max_buffer_size
            );
            eq_log!("[INIT] sr={sample_rate} ch={channels}");

            #[cfg(feature = "debug")]
            crate::debug::ring::drain_to_file();

            true
        }))
        .unwrap_or(false)
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        let params = self.params.clone();
        let spectrum = self.spectrum.clone();
        create_vizia_editor(
            self.params.editor_state.clone(),
            ViziaTheming::default(),
            move |cx, gui_context| {
                build_ui(cx, params.clone(), spectrum.clone(), gui_context);
            },
        )
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.process_internal(buffer.as_slice())
        }))
        .unwrap_or(ProcessStatus::Normal)
    }

    fn reset(&mut self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            for chain in &mut self.chains {
                chain.reset();
            }
            self.sampler.reset();
        }));
    }

    fn deactivate(&mut self) {
        self.controller.release();
        eq_log!("[DEACTIVATE]");
    }
}

impl SimpleEq {
    /// Clear filter and spectrum history and load coefficients for `sample_rate`.
    /// Returns false for an unusable rate.
    fn prepare(&mut self, sample_rate: f32) -> bool {
        for chain in &mut self.chains {
            chain.reset();
        }
        self.sampler.set_sample_rate(sample_rate);
        self.sampler.reset();

        if !self.controller.prepare(sample_rate) {
            return false;
        }

        // Coefficients are in place before the first block
        let settings = ChannelSettings::from_params(&self.params);
        self.controller.update(&settings, &mut self.chains)
    }

    /// Filter one block in place. Stereo feeds `(L + R) / 2` to the spectrum, mono feeds the channel.
    fn process_internal(&mut self, channels: &mut [&mut [f32]]) -> ProcessStatus {
        // One snapshot per block
        let settings = ChannelSettings::from_params(&self.params);
        if !self.controller.update(&settings, &mut self.chains) {
            return ProcessStatus::Normal;
        }

        let [left_chain, right_chain] = &mut self.chains;
        let sampler = &mut self.sampler;

        match channels {
            [left, right, ..] => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    *l = left_chain.process(*l);
                    *r = right_chain.process(*r);
                    sampler.push(0.5 * (*l + *r));
                }
            }
            [mono] => {
                for s in mono.iter_mut() {
                    *s = left_chain.process(*s);
                    sampler.push(*s);
                }
            }
            [] => {}
        }

        ProcessStatus::Normal
    }
}

impl ClapPlugin for SimpleEq {
    const CLAP_ID: &'static str = "com.simple-eq.simple-eq";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Low cut, peak and high cut equalizer with a spectrum display");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Equalizer,
        ClapFeature::Filter,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for SimpleEq {
    const VST3_CLASS_ID: [u8; 16] = *b"SimpleEqCascade1";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Eq];
}

nih_export_clap!(SimpleEq);
nih_export_vst3!(SimpleEq);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_ranges() {
        let params = EqParams::default();
        assert_eq!(params.low_cut_freq.value(), 20.0);
        assert_eq!(params.high_cut_freq.value(), 20000.0);
        assert_eq!(params.peak_freq.value(), 750.0);
        assert_eq!(params.peak_gain.value(), 0.0);
        assert_eq!(params.peak_quality.value(), 1.0);
        assert_eq!(params.low_cut_slope.value(), Slope::Db12);

        // Skewed ranges put more of the knob travel at the low end
        let mid = params.peak_freq.preview_plain(0.5);
        assert!(mid < 2000.0, "{mid}");
    }

    #[test]
    fn test_value_formatting() {
        assert_eq!(format_hz(750.0), "750 Hz");
        assert_eq!(format_hz(2500.0), "2.50 kHz");
        assert_eq!(format_hz(999.4), "999 Hz");
        assert_eq!(format_hz(999.7), "1.00 kHz");
        assert_eq!(format_hz(1000.0), "1.00 kHz");
        assert_eq!(format_db(-6.0), "-6.0 dB");
        assert_eq!(format_quality(0.7), "Q 0.70");
    }

    #[test]
    fn test_unprepared_plugin_passes_through() {
        let mut plugin = SimpleEq::default();
        let settings = ChannelSettings {
            peak_gain_db: 12.0,
            ..ChannelSettings::default()
        };
        assert!(!plugin.controller.update(&settings, &mut plugin.chains));
        assert_eq!(plugin.chains[0].process(0.5), 0.5);
    }

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| ((i % 97) as f32 / 97.0) - 0.5).collect()
    }

    /// Run `input` through a standalone chain loaded with the default settings.
    fn reference(input: &[f32], sample_rate: f32) -> Vec<f32> {
        let mut chain = EqChain::new();
        chain.update_from_settings(&ChannelSettings::default(), sample_rate);
        input.iter().map(|&x| chain.process(x)).collect()
    }

    #[test]
    fn test_block_untouched_before_prepare() {
        let mut plugin = SimpleEq::default();
        let mut left = ramp(256);
        let mut right = vec![0.25; 256];

        let status = plugin.process_internal(&mut [left.as_mut_slice(), right.as_mut_slice()]);

        assert!(matches!(status, ProcessStatus::Normal));
        assert_eq!(left, ramp(256));
        assert_eq!(right, vec![0.25; 256]);
        assert_eq!(plugin.spectrum.try_consume(), None);
    }

    #[test]
    fn test_invalid_rate_keeps_pass_through() {
        let mut plugin = SimpleEq::default();
        assert!(!plugin.prepare(0.0));
        let mut mono = ramp(64);
        plugin.process_internal(&mut [mono.as_mut_slice()]);
        assert_eq!(mono, ramp(64));
    }

    #[test]
    fn test_stereo_channels_filtered_independently() {
        let mut plugin = SimpleEq::default();
        assert!(plugin.prepare(48000.0));

        // Impulse on the left only
        let mut left = vec![0.0; 512];
        left[0] = 1.0;
        let mut right = vec![0.0; 512];
        let expected_left = reference(&left, 48000.0);

        plugin.process_internal(&mut [left.as_mut_slice(), right.as_mut_slice()]);

        assert_eq!(left, expected_left);
        assert!(right.iter().all(|&s| s.abs() < 1e-6), "right channel picked up the left");
    }

    #[test]
    fn test_mono_block_uses_one_chain() {
        let mut plugin = SimpleEq::default();
        assert!(plugin.prepare(44100.0));

        let input = ramp(300);
        let mut mono = input.clone();
        plugin.process_internal(&mut [mono.as_mut_slice()]);

        assert_eq!(mono, reference(&input, 44100.0));
        assert_ne!(mono, input);
    }

    #[test]
    fn test_history_carries_across_blocks() {
        let mut whole = SimpleEq::default();
        let mut split = SimpleEq::default();
        assert!(whole.prepare(48000.0));
        assert!(split.prepare(48000.0));

        let input = ramp(1000);
        let mut a = input.clone();
        whole.process_internal(&mut [a.as_mut_slice()]);

        let mut b = input;
        let (first, second) = b.split_at_mut(333);
        split.process_internal(&mut [first]);
        split.process_internal(&mut [second]);

        assert_eq!(a, b);
    }

    #[test]
    fn test_reset_clears_filter_and_spectrum_history() {
        let mut plugin = SimpleEq::default();
        assert!(plugin.prepare(48000.0));

        let mut block = ramp(spectrum::consts::FFT_SIZE - 1);
        plugin.process_internal(&mut [block.as_mut_slice()]);

        Plugin::reset(&mut plugin);

        // No ringing from the previous block, and the window starts over
        let mut silence = vec![0.0; 16];
        plugin.process_internal(&mut [silence.as_mut_slice()]);
        assert!(silence.iter().all(|&s| s.abs() < 1e-6));
        assert_eq!(plugin.spectrum.try_consume(), None);
    }

    #[test]
    fn test_spectrum_frame_after_one_window() {
        let mut plugin = SimpleEq::default();
        assert!(plugin.prepare(48000.0));

        let tone: Vec<f32> = (0..spectrum::consts::FFT_SIZE)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 1500.0 * i as f32 / 48000.0).sin())
            .collect();

        // One frame short: nothing published yet
        let (head, tail) = tone.split_at(spectrum::consts::FFT_SIZE - 1);
        let mut left = head.to_vec();
        let mut right = head.to_vec();
        plugin.process_internal(&mut [left.as_mut_slice(), right.as_mut_slice()]);
        assert_eq!(plugin.spectrum.try_consume(), None);

        let mut left = tail.to_vec();
        let mut right = tail.to_vec();
        plugin.process_internal(&mut [left.as_mut_slice(), right.as_mut_slice()]);
        let frame = plugin.spectrum.try_consume().expect("frame after a full window");
        assert!(!spectrum::is_silent(&frame));
        assert_eq!(plugin.spectrum.sample_rate(), 48000.0);
    }

    #[test]
    fn test_stereo_spectrum_taps_the_channel_average() {
        let mut plugin = SimpleEq::default();
        assert!(plugin.prepare(48000.0));

        // Opposite-polarity channels cancel in (L + R) / 2
        let mut left: Vec<f32> = (0..spectrum::consts::FFT_SIZE)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 1500.0 * i as f32 / 48000.0).sin())
            .collect();
        let mut right: Vec<f32> = left.iter().map(|&s| -s).collect();
        plugin.process_internal(&mut [left.as_mut_slice(), right.as_mut_slice()]);

        let frame = plugin.spectrum.try_consume().expect("frame after a full window");
        assert!(spectrum::is_silent(&frame));
        assert!(left.iter().any(|&s| s.abs() > 0.1));
    }
}
