use ndarray::{s, Array, Array2, ArrayView2};

use crate::config::Scheme;
use crate::error::{Error, Result};

mod diffusivity;
mod flux;
mod gradient;

pub use diffusivity::{diffusivity, Diffusivity};
pub use flux::{enforce_boundary, fluxes, step, Fluxes};
pub use gradient::{gradient_magnitude, GradientOperator};

/// One channel of the diffused signal.
///
/// The interior is surrounded by a one-cell Dirichlet frame which is never
/// written after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    u: Array2<f64>,
}

impl Field {
    /// Embed `interior` into a field with a zero frame.
    pub fn new(interior: ArrayView2<f64>) -> Result<Self> {
        Self::with_border(interior, 0.0)
    }

    /// Embed `interior` into a field whose frame holds `border`.
    pub fn with_border(interior: ArrayView2<f64>, border: f64) -> Result<Self> {
        let (h, w) = interior.dim();
        if h == 0 || w == 0 {
            return Err(Error::EmptyField);
        }

        let mut u = Array::from_elem((h + 2, w + 2), border);
        u.slice_mut(s![1..=h, 1..=w]).assign(&interior);

        Ok(Self { u })
    }

    /// Interior shape `(rows, cols)`, without the frame.
    pub fn dim(&self) -> (usize, usize) {
        let (h, w) = self.u.dim();
        (h - 2, w - 2)
    }

    /// The full grid including the frame.
    pub fn grid(&self) -> &Array2<f64> {
        &self.u
    }

    pub fn interior(&self) -> ArrayView2<f64> {
        self.u.slice(s![1..-1, 1..-1])
    }

    pub fn into_interior(self) -> Array2<f64> {
        self.interior().to_owned()
    }
}

/// Advance one channel by a single explicit step.
///
/// Diffusivity is evaluated once from the pre-step grid and shared by all
/// four fluxes.
pub fn perona_malik(field: &Field, scheme: &Scheme) -> Result<Field> {
    let u = &field.u;

    let grad = gradient_magnitude(u, scheme.gradient);
    let mut d = diffusivity(&grad, scheme.diffusivity, scheme.contrast)?;
    enforce_boundary(&mut d);

    let fluxes = fluxes(u, &d);

    Ok(Field {
        u: step(u, &fluxes, scheme.time_step),
    })
}
