//! Centralized error type for the midibridge umbrella crate.
//!
//! Wraps the sub-crate errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] midibridge_core::Error),

    #[error(transparent)]
    Backend(#[from] midibridge_backend::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
