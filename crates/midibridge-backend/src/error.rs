//! Error types for bridge construction.
//!
//! Every variant is raised synchronously while building a bridge and is
//! fatal to that bridge. Nothing on the realtime path returns an error.

use thiserror::Error;

use crate::client::{ClientError, PortDirection};

#[derive(Error, Debug)]
pub enum Error {
    #[error("can't connect to device server: {0}")]
    Connection(ClientError),

    #[error("error creating {direction} port '{name}'")]
    PortRegistration {
        direction: PortDirection,
        name: String,
    },

    #[error("can't activate client: {0}")]
    Activation(ClientError),

    #[error(transparent)]
    Config(#[from] midibridge_core::Error),
}

impl Error {
    /// The device server could not be reached.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// A port could not be created.
    pub fn is_port_registration(&self) -> bool {
        matches!(self, Error::PortRegistration { .. })
    }

    /// The client refused to start its callback.
    pub fn is_activation(&self) -> bool {
        matches!(self, Error::Activation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
