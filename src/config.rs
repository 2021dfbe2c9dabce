use crate::d2::{Diffusivity, GradientOperator};
use crate::error::{Error, Result};

/// Largest time step for which the explicit scheme is known to be stable.
pub const STABLE_TIME_STEP: f64 = 0.25;

/// Parameters of a single diffusion step.
///
/// Nothing is validated here; [`Config::new`] checks them before a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheme {
    pub time_step: f64,
    /// Contrast constant `K` of the diffusivity function.
    pub contrast: f64,
    pub diffusivity: Diffusivity,
    pub gradient: GradientOperator,
}

impl Scheme {
    pub fn new(time_step: f64, contrast: f64, diffusivity: Diffusivity) -> Self {
        Self {
            time_step,
            contrast,
            diffusivity,
            gradient: GradientOperator::default(),
        }
    }

    pub fn with_gradient(self, gradient: GradientOperator) -> Self {
        Self { gradient, ..self }
    }

    /// Whether the time step lies in `(0, 0.25]`.
    pub fn is_stable(&self) -> bool {
        self.time_step > 0.0 && self.time_step <= STABLE_TIME_STEP
    }
}

/// Validated, immutable parameters of a whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    iterations: usize,
    scheme: Scheme,
}

impl Config {
    pub fn new(iterations: usize, scheme: Scheme) -> Result<Self> {
        if iterations == 0 {
            return Err(Error::InvalidIterations);
        }
        if !(scheme.time_step.is_finite() && scheme.time_step > 0.0) {
            return Err(Error::InvalidTimeStep(scheme.time_step));
        }
        if !(scheme.contrast.is_finite() && scheme.contrast > 0.0) {
            return Err(Error::InvalidContrast(scheme.contrast));
        }
        if !scheme.is_stable() {
            log::warn!(
                "time step {} is outside the stable range (0, {}], results may blow up",
                scheme.time_step,
                STABLE_TIME_STEP
            );
        }

        Ok(Self { iterations, scheme })
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }
}
