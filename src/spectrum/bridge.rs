//! Display Bridge
//!
//! Latest-value-wins mailbox between the sampler (audio thread) and the
//! editor's redraw timer. Backed by a triple buffer, so the writer never
//! waits and the reader always sees a whole frame. Frames published between
//! two reads are dropped.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use triple_buffer::TripleBuffer;

use super::consts::{SILENCE_THRESHOLD, SPECTRUM_BINS};
use super::SpectrumFrame;

/// Build a connected publisher/reader pair.
pub fn display_bridge() -> (SpectrumPublisher, SpectrumReader) {
    let (input, output) = TripleBuffer::new(&[0.0f32; SPECTRUM_BINS]).split();
    let sample_rate = Arc::new(AtomicU32::new(0.0f32.to_bits()));

    (
        SpectrumPublisher {
            input,
            sample_rate: sample_rate.clone(),
        },
        SpectrumReader {
            output: Arc::new(Mutex::new(output)),
            sample_rate,
        },
    )
}

/// Audio-thread end. Owned by the sampler.
pub struct SpectrumPublisher {
    input: triple_buffer::Input<SpectrumFrame>,
    sample_rate: Arc<AtomicU32>,
}

impl SpectrumPublisher {
    /// Copy `frame` into the shared slot and mark it ready. Wait-free.
    #[inline]
    pub fn publish(&mut self, frame: &SpectrumFrame) {
        self.input.write(*frame);
    }

    /// Rate the published frames were computed at.
    pub fn set_sample_rate(&self, sample_rate: f32) {
        self.sample_rate.store(sample_rate.to_bits(), Ordering::Relaxed);
    }
}

/// Redraw-side end. Cloned into the editor.
#[derive(Clone)]
pub struct SpectrumReader {
    output: Arc<Mutex<triple_buffer::Output<SpectrumFrame>>>,
    sample_rate: Arc<AtomicU32>,
}

impl SpectrumReader {
    /// Newest frame published since the last call, if any. Never blocks.
    pub fn try_consume(&self) -> Option<SpectrumFrame> {
        let mut output = self.output.try_lock().ok()?;
        if !output.updated() {
            return None;
        }
        Some(*output.read())
    }

    pub fn sample_rate(&self) -> f32 {
        f32::from_bits(self.sample_rate.load(Ordering::Relaxed))
    }
}

/// True when every point is at the display floor.
pub fn is_silent(frame: &SpectrumFrame) -> bool {
    frame.iter().all(|&m| m < SILENCE_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> SpectrumFrame {
        let mut frame = [0.0f32; SPECTRUM_BINS];
        for (i, v) in frame.iter_mut().enumerate() {
            *v = i as f32 / SPECTRUM_BINS as f32;
        }
        frame
    }

    #[test]
    fn test_nothing_published_yields_none() {
        let (_publisher, reader) = display_bridge();
        assert!(reader.try_consume().is_none());
    }

    #[test]
    fn test_consume_clears_readiness() {
        let (mut publisher, reader) = display_bridge();
        publisher.publish(&ramp());

        assert!(reader.try_consume().is_some());
        assert!(reader.try_consume().is_none());
    }

    #[test]
    fn test_publish_then_consume_returns_exact_frame() {
        let (mut publisher, reader) = display_bridge();
        let frame = ramp();
        publisher.publish(&frame);
        assert_eq!(reader.try_consume(), Some(frame));
    }

    #[test]
    fn test_latest_frame_wins() {
        let (mut publisher, reader) = display_bridge();
        publisher.publish(&[0.25; SPECTRUM_BINS]);
        publisher.publish(&[0.5; SPECTRUM_BINS]);
        publisher.publish(&[0.75; SPECTRUM_BINS]);

        assert_eq!(reader.try_consume(), Some([0.75; SPECTRUM_BINS]));
        assert!(reader.try_consume().is_none());
    }

    #[test]
    fn test_reader_clones_share_the_slot() {
        let (mut publisher, reader) = display_bridge();
        let editor_side = reader.clone();
        publisher.publish(&ramp());
        publisher.set_sample_rate(44100.0);

        assert!(editor_side.try_consume().is_some());
        assert!(reader.try_consume().is_none());
        assert_eq!(reader.sample_rate(), 44100.0);
    }

    #[test]
    fn test_publish_from_another_thread() {
        let (mut publisher, reader) = display_bridge();
        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                publisher.publish(&[i as f32 / 100.0; SPECTRUM_BINS]);
            }
        });
        handle.join().unwrap();

        // Only whole frames are ever visible
        let frame = reader.try_consume().unwrap();
        assert!(frame.iter().all(|&v| v == frame[0]));
        assert_eq!(frame[0], 0.99);
    }

    #[test]
    fn test_silence_detection() {
        assert!(is_silent(&[0.0; SPECTRUM_BINS]));
        let mut frame = [0.0; SPECTRUM_BINS];
        frame[300] = 0.2;
        assert!(!is_silent(&frame));
    }
}
