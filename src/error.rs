//! Error taxonomy for the field engine and its audio plumbing.
//!
//! Inconclusive spectra and particles sitting on the origin are handled
//! locally and never show up here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CymaticError {
    /// A configuration value is outside its documented range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The audio host could not provide a stream for the requested source
    #[error("audio device unavailable: {0}")]
    DeviceAcquisition(String),

    /// The synthetic tone engine rejected its composition
    #[error("tone generator failed: {0}")]
    Generator(String),

    #[error("wav source: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CymaticError>;
