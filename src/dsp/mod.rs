pub mod biquad;
pub mod cascade;
pub mod chain;
pub mod coefficients;
pub mod consts;
pub mod controller;
pub mod settings;
pub mod utils;

pub use biquad::{Biquad, FilterCoefficients};
pub use cascade::{CutCoefficients, CutFilter, CutKind};
pub use chain::{ChainCoefficients, EqChain};
pub use controller::{CoefficientController, ControllerState};
pub use settings::{ChannelSettings, Slope};
