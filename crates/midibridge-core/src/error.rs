//! Error types for the core MIDI primitives.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },
}

impl Error {
    pub(crate) fn check_range(field: &'static str, value: i32, min: i32, max: i32) -> Result<()> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Error::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
