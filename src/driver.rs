use std::error::Error as StdError;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{Config, Scheme};
use crate::d2::{perona_malik, Field};
use crate::error::{Error, Result};

/// All channels of the image plus the number of completed iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionState {
    channels: Vec<Field>,
    iteration: usize,
}

impl DiffusionState {
    /// Channels must be non-empty and share one shape.
    pub fn new(channels: Vec<Field>) -> Result<Self> {
        let expected = channels.first().ok_or(Error::NoChannels)?.dim();

        if let Some((index, field)) = channels
            .iter()
            .enumerate()
            .find(|(_, f)| f.dim() != expected)
        {
            return Err(Error::ChannelShape {
                index,
                expected,
                found: field.dim(),
            });
        }

        Ok(Self {
            channels,
            iteration: 0,
        })
    }

    pub fn channels(&self) -> &[Field] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Field> {
        self.channels
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Interior shape shared by every channel.
    pub fn dim(&self) -> (usize, usize) {
        self.channels[0].dim()
    }
}

/// Steps every channel concurrently on a pool with one worker per channel.
pub struct ChannelDriver {
    pool: ThreadPool,
}

impl ChannelDriver {
    pub fn new(channels: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(channels.max(1))
            .thread_name(|i| format!("pmd-channel-{}", i))
            .build()?;

        Ok(Self { pool })
    }

    /// Advance all channels by one step.
    ///
    /// Returns only once every channel has finished. If any channel fails the
    /// whole step fails.
    pub fn step(&self, state: DiffusionState, scheme: &Scheme) -> Result<DiffusionState> {
        let DiffusionState {
            channels,
            iteration,
        } = state;

        let channels = self.pool.install(|| {
            channels
                .into_par_iter()
                .map(|field| perona_malik(&field, scheme))
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(DiffusionState {
            channels,
            iteration: iteration + 1,
        })
    }
}

pub type ObserverResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

/// Notified after each completed iteration. Failures are logged and ignored.
pub trait Observer {
    fn on_iteration_complete(
        &mut self,
        index: usize,
        total: usize,
        state: &DiffusionState,
    ) -> ObserverResult;
}

impl<F> Observer for F
where
    F: FnMut(usize, usize, &DiffusionState) -> ObserverResult,
{
    fn on_iteration_complete(
        &mut self,
        index: usize,
        total: usize,
        state: &DiffusionState,
    ) -> ObserverResult {
        self(index, total, state)
    }
}

/// Runs the configured number of iterations.
pub struct IterationController<'a> {
    config: Config,
    observers: Vec<Box<dyn Observer + 'a>>,
}

impl<'a> IterationController<'a> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl Observer + 'a) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Diffuse `state` for exactly `config.iterations()` steps.
    pub fn run(&mut self, mut state: DiffusionState) -> Result<DiffusionState> {
        let total = self.config.iterations();
        let scheme = *self.config.scheme();
        let driver = ChannelDriver::new(state.channels.len())?;

        log::info!(
            "diffusing {} channel(s) of {:?} for {} iterations",
            state.channels.len(),
            state.dim(),
            total
        );

        for _ in 0..total {
            state = driver.step(state, &scheme)?;
            log::debug!("iteration {} / {}", state.iteration, total);

            for observer in &mut self.observers {
                if let Err(e) = observer.on_iteration_complete(state.iteration, total, &state) {
                    log::warn!("observer failed after iteration {}: {}", state.iteration, e);
                }
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::d2::{Diffusivity, GradientOperator};
    use ndarray::{array, Array, Array2};

    fn config(iterations: usize) -> Config {
        Config::new(iterations, Scheme::new(0.2, 0.5, Diffusivity::Exponential)).unwrap()
    }

    fn state() -> DiffusionState {
        DiffusionState::new(vec![
            Field::new(array![[1.0, 0.0], [0.0, 0.5]].view()).unwrap(),
            Field::new(array![[0.2, 0.4], [0.6, 0.8]].view()).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_state_validation() {
        assert!(matches!(DiffusionState::new(vec![]), Err(Error::NoChannels)));

        let result = DiffusionState::new(vec![
            Field::new(array![[1.0, 0.0]].view()).unwrap(),
            Field::new(array![[1.0], [0.0]].view()).unwrap(),
        ]);
        assert!(matches!(
            result,
            Err(Error::ChannelShape {
                index: 1,
                expected: (1, 2),
                found: (2, 1),
            })
        ));
    }

    #[test]
    fn test_driver_advances_iteration() {
        let driver = ChannelDriver::new(2).unwrap();
        let scheme = *config(1).scheme();

        let next = driver.step(state(), &scheme).unwrap();
        assert_eq!(next.iteration(), 1);
        assert_eq!(next.channels().len(), 2);
    }

    #[test]
    fn test_driver_fails_whole_step() {
        let driver = ChannelDriver::new(2).unwrap();
        let scheme = Scheme::new(0.2, 0.0, Diffusivity::Rational);

        assert!(matches!(
            driver.step(state(), &scheme),
            Err(Error::InvalidContrast(_))
        ));
    }

    #[test]
    fn test_controller_notifies_each_iteration() {
        let mut seen = Vec::new();

        let result = IterationController::new(config(4))
            .with_observer(|index: usize, total: usize, state: &DiffusionState| -> ObserverResult {
                seen.push((index, total, state.iteration()));
                Ok(())
            })
            .run(state())
            .unwrap();

        assert_eq!(result.iteration(), 4);
        assert_eq!(seen, vec![(1, 4, 1), (2, 4, 2), (3, 4, 3), (4, 4, 4)]);
    }

    #[test]
    fn test_failing_observer_does_not_affect_state() {
        let expected = IterationController::new(config(3)).run(state()).unwrap();

        let result = IterationController::new(config(3))
            .with_observer(|_: usize, _: usize, _: &DiffusionState| -> ObserverResult {
                Err("display went away".into())
            })
            .run(state())
            .unwrap();

        assert_eq!(result, expected);
    }

    fn pattern(h: usize, w: usize, seed: usize) -> Array2<f64> {
        Array::from_shape_fn((h, w), |(i, j)| ((i * 7 + j * 13 + seed * 5) % 11) as f64 / 10.0)
    }

    fn diffuse(config: Config, interiors: &[Array2<f64>]) -> Vec<Field> {
        let channels = interiors
            .iter()
            .map(|x| Field::new(x.view()).unwrap())
            .collect();
        let state = DiffusionState::new(channels).unwrap();

        IterationController::new(config)
            .run(state)
            .unwrap()
            .into_channels()
    }

    fn long_config(diffusivity: Diffusivity, gradient: GradientOperator) -> Config {
        Config::new(12, Scheme::new(0.2, 0.3, diffusivity).with_gradient(gradient)).unwrap()
    }

    #[test]
    fn test_channels_diffuse_independently() {
        let interiors: Vec<_> = (0..3).map(|c| pattern(9, 14, c)).collect();

        for &diffusivity in &[Diffusivity::Exponential, Diffusivity::Rational] {
            for &gradient in &[
                GradientOperator::CentralDifference,
                GradientOperator::Sobel,
                GradientOperator::Laplacian,
            ] {
                let config = long_config(diffusivity, gradient);
                let together = diffuse(config, &interiors);

                for (c, interior) in interiors.iter().enumerate() {
                    let alone = diffuse(config, std::slice::from_ref(interior));
                    assert_eq!(together[c], alone[0]);
                }
            }
        }
    }

    #[test]
    fn test_frame_survives_many_iterations() {
        let interiors = vec![pattern(6, 5, 1), pattern(6, 5, 2)];
        let channels = diffuse(
            long_config(Diffusivity::Rational, GradientOperator::Sobel),
            &interiors,
        );

        for field in &channels {
            let grid = field.grid();
            let (h, w) = grid.dim();
            assert!(grid.row(0).iter().all(|&v| v == 0.0));
            assert!(grid.row(h - 1).iter().all(|&v| v == 0.0));
            assert!(grid.column(0).iter().all(|&v| v == 0.0));
            assert!(grid.column(w - 1).iter().all(|&v| v == 0.0));
            assert_eq!(field.dim(), (6, 5));
        }
    }

    #[test]
    fn test_smoothing_reduces_variation() {
        let interior = pattern(16, 16, 0);
        let channels = diffuse(
            long_config(Diffusivity::Rational, GradientOperator::CentralDifference),
            std::slice::from_ref(&interior),
        );

        let variation = |x: &Array2<f64>| -> f64 {
            x.windows((1, 2))
                .into_iter()
                .map(|w| (w[[0, 1]] - w[[0, 0]]).abs())
                .sum()
        };

        let smoothed = channels[0].interior().to_owned();
        assert!(variation(&smoothed) < variation(&interior));
    }
}
