use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("number of iterations should be greater than 0")]
    InvalidIterations,
    #[error("time step should be a positive finite number, got {0}")]
    InvalidTimeStep(f64),
    #[error("constant K should be a positive finite number, got {0}")]
    InvalidContrast(f64),
    #[error("field interior must be at least 1x1")]
    EmptyField,
    #[error("diffusion state needs at least one channel")]
    NoChannels,
    #[error("channel {index} has shape {found:?}, expected {expected:?}")]
    ChannelShape {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("failed to build channel worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
