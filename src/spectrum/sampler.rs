//! Spectrum Sampler
//!
//! Runs on the audio thread, fed one post-EQ sample at a time. Every
//! `HOP_SIZE` samples (once the first `FFT_SIZE` window is full) it:
//! - Hann-windows the newest `FFT_SIZE` samples
//! - Runs a forward FFT
//! - Maps each bin's magnitude from `[MIN_DB, MAX_DB]` to `[0, 1]` and publishes the frame
//!
//! Every buffer is sized in `new`; `push` never allocates.

use std::f32::consts::PI;
use std::sync::Arc;

use ringbuf::{Consumer, Producer, RingBuffer};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::bridge::SpectrumPublisher;
use super::consts::{FFT_SIZE, HOP_SIZE, MAX_DB, MIN_DB, SPECTRUM_BINS};
use super::SpectrumFrame;
use crate::dsp::utils::gain_to_db;

/// Periodic Hann window.
fn make_hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / len as f32).cos())
        .collect()
}

pub struct SpectrumSampler {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    frame: SpectrumFrame,
    sample_rate: f32,

    input_producer: Producer<f32>,
    input_consumer: Consumer<f32>,
    publisher: SpectrumPublisher,
}

impl SpectrumSampler {
    pub fn new(publisher: SpectrumPublisher, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let fft_scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        let (input_producer, input_consumer) = RingBuffer::<f32>::new(FFT_SIZE * 2).split();

        let mut sampler = Self {
            fft,
            window: make_hann_window(FFT_SIZE),
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            fft_scratch,
            frame: [0.0; SPECTRUM_BINS],
            sample_rate: 0.0,
            input_producer,
            input_consumer,
            publisher,
        };
        sampler.set_sample_rate(sample_rate);
        sampler
    }

    /// Record the rate the editor needs to place bins on its frequency axis.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.publisher.set_sample_rate(sample_rate);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Drop buffered samples. The next frame needs a full window again.
    pub fn reset(&mut self) {
        let buffered = self.input_consumer.len();
        self.input_consumer.discard(buffered);
    }

    /// Feed one sample. Returns true if a frame was published.
    #[inline]
    pub fn push(&mut self, sample: f32) -> bool {
        let _ = self.input_producer.push(sample);
        if self.input_consumer.len() < FFT_SIZE {
            return false;
        }

        for ((dst, src), w) in self
            .buffer
            .iter_mut()
            .zip(self.input_consumer.iter().take(FFT_SIZE))
            .zip(self.window.iter())
        {
            *dst = Complex::new(*src * *w, 0.0);
        }
        self.input_consumer.discard(HOP_SIZE);

        #[cfg(debug_assertions)]
        assert_no_alloc::assert_no_alloc(|| {
            self.fft
                .process_with_scratch(&mut self.buffer, &mut self.fft_scratch);
        });
        #[cfg(not(debug_assertions))]
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.fft_scratch);

        self.render_frame();
        self.publisher.publish(&self.frame);
        true
    }

    /// Most recent frame this sampler produced.
    pub fn frame(&self) -> &SpectrumFrame {
        &self.frame
    }

    fn render_frame(&mut self) {
        // Hann coherent gain is 0.5 and a real sine splits over +/- bins
        let norm = 4.0 / FFT_SIZE as f32;
        let range = MAX_DB - MIN_DB;
        for (out, bin) in self.frame.iter_mut().zip(self.buffer.iter()) {
            let db = gain_to_db(bin.norm() * norm, MIN_DB);
            *out = ((db - MIN_DB) / range).clamp(0.0, 1.0);
        }
    }
}
