//! Coefficient Update Controller
//!
//! Owns the prepared sample rate and turns a [`ChannelSettings`] snapshot into
//! coefficients once per block. The design runs once and the result is loaded
//! into every channel's chain, so left and right always agree.

use crate::dsp::chain::{ChainCoefficients, EqChain};
use crate::dsp::settings::ChannelSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerState {
    Uninitialized,
    Ready { sample_rate: f32 },
}

pub struct CoefficientController {
    state: ControllerState,
    last: Option<ChainCoefficients>,
}

impl Default for CoefficientController {
    fn default() -> Self {
        Self::new()
    }
}

impl CoefficientController {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Uninitialized,
            last: None,
        }
    }

    /// Enter `Ready` at `sample_rate`. Returns false and drops back to
    /// `Uninitialized` if the rate is not a positive finite number.
    pub fn prepare(&mut self, sample_rate: f32) -> bool {
        self.last = None;
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            self.state = ControllerState::Uninitialized;
            return false;
        }
        self.state = ControllerState::Ready { sample_rate };
        true
    }

    pub fn release(&mut self) {
        self.state = ControllerState::Uninitialized;
        self.last = None;
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ControllerState::Ready { .. })
    }

    pub fn sample_rate(&self) -> Option<f32> {
        match self.state {
            ControllerState::Ready { sample_rate } => Some(sample_rate),
            ControllerState::Uninitialized => None,
        }
    }

    /// Design coefficients for `settings` and load them into `chains`.
    ///
    /// No-op returning false while uninitialized. Called at the top of every
    /// block; it does not allocate.
    #[inline]
    pub fn update(&mut self, settings: &ChannelSettings, chains: &mut [EqChain]) -> bool {
        let ControllerState::Ready { sample_rate } = self.state else {
            return false;
        };

        let coeffs = ChainCoefficients::design(settings, sample_rate);
        for chain in chains.iter_mut() {
            chain.apply(&coeffs);
        }
        self.last = Some(coeffs);
        true
    }

    /// Coefficients from the most recent successful `update`.
    pub fn last_coefficients(&self) -> Option<&ChainCoefficients> {
        self.last.as_ref()
    }
}
