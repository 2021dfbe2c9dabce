//! Edge-preserving smoothing of multi-channel 2-D fields by Perona-Malik
//! anisotropic diffusion.
//!
//! [`d2`] holds the per-channel numerical pipeline, [`driver`] fans it out
//! over channels and repeats it for a fixed number of iterations.

pub mod config;
pub mod d2;
pub mod driver;
pub mod error;

pub use config::{Config, Scheme};
pub use d2::{Diffusivity, Field, GradientOperator};
pub use driver::{ChannelDriver, DiffusionState, IterationController, Observer};
pub use error::{Error, Result};
