use ndarray::{azip, s, Array2, ArrayView2, Zip};

/// Zero the outer ring of a diffusivity grid so nothing crosses the frame.
pub fn enforce_boundary(d: &mut Array2<f64>) {
    let (h, w) = d.dim();

    assert!(h >= 1 && w >= 1);

    d.row_mut(0).fill(0.0);
    d.row_mut(h - 1).fill(0.0);
    d.column_mut(0).fill(0.0);
    d.column_mut(w - 1).fill(0.0);
}

/// Diffusivity-weighted differences towards each cardinal neighbour.
///
/// All four grids are aligned with the field; their outer ring is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Fluxes {
    pub north: Array2<f64>,
    pub south: Array2<f64>,
    pub east: Array2<f64>,
    pub west: Array2<f64>,
}

fn directional(u: &Array2<f64>, d: &Array2<f64>, neighbour: ArrayView2<f64>) -> Array2<f64> {
    let mut flux = Array2::zeros(u.dim());

    azip!((
        f in flux.slice_mut(s![1..-1, 1..-1]),
        &c in u.slice(s![1..-1, 1..-1]),
        &n in neighbour,
        &g in d.slice(s![1..-1, 1..-1]),
    ) {
        *f = g * (n - c);
    });

    flux
}

/// Compute the four fluxes of `u` under diffusivity `d`.
pub fn fluxes(u: &Array2<f64>, d: &Array2<f64>) -> Fluxes {
    assert_eq!(u.dim(), d.dim());

    Fluxes {
        north: directional(u, d, u.slice(s![..-2, 1..-1])),
        south: directional(u, d, u.slice(s![2.., 1..-1])),
        east: directional(u, d, u.slice(s![1..-1, 2..])),
        west: directional(u, d, u.slice(s![1..-1, ..-2])),
    }
}

/// Explicit Euler update of the interior of `u`. The frame is copied unchanged.
pub fn step(u: &Array2<f64>, fluxes: &Fluxes, time_step: f64) -> Array2<f64> {
    let mut next = u.clone();

    Zip::from(next.slice_mut(s![1..-1, 1..-1]))
        .and(fluxes.north.slice(s![1..-1, 1..-1]))
        .and(fluxes.south.slice(s![1..-1, 1..-1]))
        .and(fluxes.east.slice(s![1..-1, 1..-1]))
        .and(fluxes.west.slice(s![1..-1, 1..-1]))
        .for_each(|e, &north, &south, &east, &west| {
            *e += time_step * (north + south + east + west);
        });

    next
}
