use ndarray::Array2;

use crate::error::{Error, Result};

/// Edge-stopping function mapping gradient magnitude to a diffusivity in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diffusivity {
    /// `exp(-(m / K)^2)`, stops diffusion sharply at high-contrast edges.
    Exponential,
    /// `1 / (1 + (m / K)^2)`, heavier tail that still smooths moderate edges.
    Rational,
}

impl Diffusivity {
    /// Diffusivity for magnitude `m` and contrast `k`.
    ///
    /// `k` must be positive. Results that would underflow to zero are clamped
    /// to the smallest positive value.
    pub fn eval(self, m: f64, k: f64) -> f64 {
        let r = (m / k).powi(2);
        let g = match self {
            Diffusivity::Exponential => (-r).exp(),
            Diffusivity::Rational => 1.0 / (1.0 + r),
        };
        g.max(f64::MIN_POSITIVE)
    }
}

/// Map a gradient magnitude grid through `variant`.
pub fn diffusivity(grad: &Array2<f64>, variant: Diffusivity, k: f64) -> Result<Array2<f64>> {
    if !(k.is_finite() && k > 0.0) {
        return Err(Error::InvalidContrast(k));
    }

    Ok(grad.mapv(|m| variant.eval(m, k)))
}
