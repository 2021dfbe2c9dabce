use ndarray::{Array, Array2};

/// Discrete estimator of the local gradient magnitude.
///
/// A run must stick to one estimator. Central differences and Sobel both
/// report zero at a cell whose opposite neighbours are equal, however sharply
/// the cell itself stands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientOperator {
    /// `hypot` of the two central differences.
    CentralDifference,
    /// `hypot` of the unnormalised 3x3 Sobel responses.
    Sobel,
    /// Absolute value of the 4-neighbour Laplacian.
    Laplacian,
}

impl Default for GradientOperator {
    fn default() -> Self {
        GradientOperator::Sobel
    }
}

fn central_difference(u: &Array2<f64>, i: usize, j: usize) -> f64 {
    let gx = 0.5 * (u[[i, j + 1]] - u[[i, j - 1]]);
    let gy = 0.5 * (u[[i + 1, j]] - u[[i - 1, j]]);
    gx.hypot(gy)
}

fn sobel(u: &Array2<f64>, i: usize, j: usize) -> f64 {
    let sx = (u[[i - 1, j + 1]] + 2.0 * u[[i, j + 1]] + u[[i + 1, j + 1]])
        - (u[[i - 1, j - 1]] + 2.0 * u[[i, j - 1]] + u[[i + 1, j - 1]]);
    let sy = (u[[i + 1, j - 1]] + 2.0 * u[[i + 1, j]] + u[[i + 1, j + 1]])
        - (u[[i - 1, j - 1]] + 2.0 * u[[i - 1, j]] + u[[i - 1, j + 1]]);
    sx.hypot(sy)
}

fn laplacian(u: &Array2<f64>, i: usize, j: usize) -> f64 {
    (u[[i - 1, j]] + u[[i + 1, j]] + u[[i, j - 1]] + u[[i, j + 1]] - 4.0 * u[[i, j]]).abs()
}

/// Gradient magnitude of every interior cell of `u`. The outer ring is left at 0.
pub fn gradient_magnitude(u: &Array2<f64>, op: GradientOperator) -> Array2<f64> {
    let (h, w) = u.dim();

    let estimate: fn(&Array2<f64>, usize, usize) -> f64 = match op {
        GradientOperator::CentralDifference => central_difference,
        GradientOperator::Sobel => sobel,
        GradientOperator::Laplacian => laplacian,
    };

    Array::from_shape_fn((h, w), |(i, j)| {
        if i == 0 || j == 0 || i + 1 == h || j + 1 == w {
            0.0
        } else {
            estimate(u, i, j)
        }
    })
}
