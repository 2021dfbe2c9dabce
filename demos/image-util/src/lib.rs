use std::path::Path;

use anyhow::{ensure, Context};
use image::{Rgb, RgbImage};
use ndarray::{Array, Array2};
use pmd::{DiffusionState, Field};

/// Split an 8-bit RGB image into three channels scaled into `[0, 1]`.
pub fn load_channels(path: impl AsRef<Path>) -> anyhow::Result<Vec<Array2<f64>>> {
    let path = path.as_ref();
    let img = image::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?
        .to_rgb8();

    Ok(split_rgb(&img))
}

pub fn split_rgb(img: &RgbImage) -> Vec<Array2<f64>> {
    let (w, h) = img.dimensions();

    (0..3)
        .map(|c| {
            Array::from_shape_fn((h as usize, w as usize), |(i, j)| {
                img.get_pixel(j as u32, i as u32)[c] as f64 / 255.0
            })
        })
        .collect()
}

/// Load an image straight into a diffusion state with a zero frame.
pub fn load_state(path: impl AsRef<Path>) -> anyhow::Result<DiffusionState> {
    let channels = load_channels(path)?
        .iter()
        .map(|x| Field::new(x.view()))
        .collect::<pmd::Result<Vec<_>>>()?;

    Ok(DiffusionState::new(channels)?)
}

fn to_u8(x: f64) -> u8 {
    (x * 255.0).max(0.0).min(255.0) as u8
}

/// Merge one to three equally sized channels into an RGB image.
///
/// A single channel is written as grey.
pub fn merge_rgb(channels: &[Array2<f64>]) -> anyhow::Result<RgbImage> {
    ensure!(
        !channels.is_empty() && channels.len() <= 3,
        "expected 1 to 3 channels, got {}",
        channels.len()
    );
    let shape = channels[0].dim();
    ensure!(
        channels.iter().all(|x| x.dim() == shape),
        "channels differ in shape"
    );

    let mut img = RgbImage::new(shape.1 as u32, shape.0 as u32);

    for i in 0..shape.0 {
        for j in 0..shape.1 {
            let mut px = [0u8; 3];
            for (c, p) in px.iter_mut().enumerate() {
                *p = to_u8(channels[c.min(channels.len() - 1)][[i, j]]);
            }
            img.put_pixel(j as u32, i as u32, Rgb(px));
        }
    }

    Ok(img)
}

/// Crop the frame off every channel of `state` and save it as one image.
pub fn save_state(path: impl AsRef<Path>, state: &DiffusionState) -> anyhow::Result<()> {
    let path = path.as_ref();
    let channels: Vec<_> = state
        .channels()
        .iter()
        .map(|f| f.interior().to_owned())
        .collect();

    merge_rgb(&channels)?
        .save(path)
        .with_context(|| format!("failed to write image {}", path.display()))?;

    Ok(())
}

/// Save `state` as frame `index` of an animation under `dir`.
pub fn save_frame(
    dir: impl AsRef<Path>,
    prefix: &str,
    index: usize,
    state: &DiffusionState,
) -> anyhow::Result<()> {
    save_state(
        dir.as_ref().join(format!("{}_{:06}.png", prefix, index)),
        state,
    )
}
