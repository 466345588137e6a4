//! Spectrum + response curve display.
//!
//! Redraws at ~60 Hz. Each redraw takes the newest frame from the bridge (or
//! keeps the last one if nothing new arrived) and recomputes the EQ curve
//! from the live parameter values. Filter state is never touched.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use nih_plug_vizia::vizia::prelude::*;
use nih_plug_vizia::vizia::vg;

use crate::dsp::{ChainCoefficients, ChannelSettings};
use crate::spectrum::consts::{MIN_DISPLAY_HZ, SPECTRUM_BINS};
use crate::spectrum::{
    bin_frequency, frequency_to_position, is_silent, position_to_frequency, SpectrumFrame,
    SpectrumReader,
};
use crate::EqParams;

const REDRAW_INTERVAL: Duration = Duration::from_millis(16);

/// Vertical range of the response curve.
const RESPONSE_RANGE_DB: f32 = 24.0;

const GRID_FREQUENCIES: [f32; 10] = [
    20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0,
];
const GRID_GAINS: [f32; 5] = [-24.0, -12.0, 0.0, 12.0, 24.0];

/// Fallback before the host has told us a rate.
const FALLBACK_SAMPLE_RATE: f32 = 44100.0;

pub struct SpectrumView {
    params: Arc<EqParams>,
    spectrum: SpectrumReader,
    frame: Cell<SpectrumFrame>,
}

impl SpectrumView {
    pub fn new(
        cx: &mut Context,
        params: Arc<EqParams>,
        spectrum: SpectrumReader,
    ) -> Handle<'_, Self> {
        Self {
            params,
            spectrum,
            frame: Cell::new([0.0; SPECTRUM_BINS]),
        }
        .build(cx, |cx| {
            let timer = cx.add_timer(REDRAW_INTERVAL, None, |cx, action| {
                if let TimerAction::Tick(_) = action {
                    cx.needs_redraw();
                }
            });
            cx.start_timer(timer);
        })
    }

    fn sample_rate(&self) -> f32 {
        let sr = self.spectrum.sample_rate();
        if sr > 0.0 {
            sr
        } else {
            FALLBACK_SAMPLE_RATE
        }
    }
}

/// Map a gain in dB to a y coordinate inside `[top, top + height]`.
fn gain_to_y(gain_db: f32, top: f32, height: f32) -> f32 {
    let t = ((gain_db + RESPONSE_RANGE_DB) / (2.0 * RESPONSE_RANGE_DB)).clamp(0.0, 1.0);
    top + height * (1.0 - t)
}

/// First bin at or above the lowest displayed frequency.
fn first_visible_bin(sample_rate: f32) -> usize {
    (1..SPECTRUM_BINS)
        .find(|&bin| bin_frequency(bin, sample_rate) >= MIN_DISPLAY_HZ)
        .unwrap_or(SPECTRUM_BINS - 1)
}

impl View for SpectrumView {
    fn element(&self) -> Option<&'static str> {
        Some("spectrum-view")
    }

    fn draw(&self, cx: &mut DrawContext, canvas: &mut Canvas) {
        let bounds = cx.bounds();
        if bounds.w <= 1.0 || bounds.h <= 1.0 {
            return;
        }
        let sample_rate = self.sample_rate();

        // Background
        let mut bg = vg::Path::new();
        bg.rect(bounds.x, bounds.y, bounds.w, bounds.h);
        canvas.fill_path(&bg, &vg::Paint::color(vg::Color::rgb(15, 23, 42)));

        // Grid
        let mut grid = vg::Path::new();
        for &f in &GRID_FREQUENCIES {
            let x = bounds.x + bounds.w * frequency_to_position(f, sample_rate);
            grid.move_to(x, bounds.y);
            grid.line_to(x, bounds.y + bounds.h);
        }
        for &g in &GRID_GAINS {
            let y = gain_to_y(g, bounds.y, bounds.h);
            grid.move_to(bounds.x, y);
            grid.line_to(bounds.x + bounds.w, y);
        }
        canvas.stroke_path(
            &grid,
            &vg::Paint::color(vg::Color::rgb(51, 65, 85)).with_line_width(1.0),
        );

        // Spectrum
        if let Some(frame) = self.spectrum.try_consume() {
            self.frame.set(frame);
        }
        let frame = self.frame.get();
        if !is_silent(&frame) {
            let first = first_visible_bin(sample_rate);
            let mut path = vg::Path::new();
            for (bin, &v) in frame.iter().enumerate().skip(first) {
                let pos = frequency_to_position(bin_frequency(bin, sample_rate), sample_rate);
                let x = bounds.x + bounds.w * pos;
                let y = bounds.y + bounds.h * (1.0 - v);
                if bin == first {
                    path.move_to(x, y);
                } else {
                    path.line_to(x, y);
                }
            }
            canvas.stroke_path(
                &path,
                &vg::Paint::color(vg::Color::rgba(0, 255, 255, 191)).with_line_width(2.0),
            );
        }

        // Response curve, one point per pixel column
        let coeffs =
            ChainCoefficients::design(&ChannelSettings::from_params(&self.params), sample_rate);
        let columns = bounds.w.max(2.0) as usize;
        let mut curve = vg::Path::new();
        for col in 0..columns {
            let t = col as f32 / (columns - 1) as f32;
            let freq = position_to_frequency(t, sample_rate);
            let db = coeffs.magnitude_db_at(freq) as f32;
            let x = bounds.x + t * bounds.w;
            let y = gain_to_y(db, bounds.y, bounds.h);
            if col == 0 {
                curve.move_to(x, y);
            } else {
                curve.line_to(x, y);
            }
        }
        canvas.stroke_path(
            &curve,
            &vg::Paint::color(vg::Color::rgb(255, 255, 255)).with_line_width(2.0),
        );

        // Border
        canvas.stroke_path(
            &bg,
            &vg::Paint::color(vg::Color::rgb(100, 116, 139)).with_line_width(1.0),
        );
    }
}
