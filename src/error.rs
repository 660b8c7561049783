//! Error type shared by tasks, the loader and its collaborators.
//!
//! Collaborators (fetchers, backends) report failures with [`anyhow::Error`]; the loader wraps
//! them together with the identifier of the resource that failed, so every failure is
//! attributable to exactly one queued resource.

use thiserror::Error;

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The resource could not be fetched (missing file, bad HTTP status, network error).
    #[error("failed to fetch `{id}`: {source}")]
    Fetch {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The fetched bytes could not be decoded into the requested kind (text, JSON, image).
    #[error("failed to decode `{id}`: {source}")]
    Decode {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The backend rejected a decoded image.
    #[error("failed to create texture `{id}`: {source}")]
    Texture {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Compiling or linking a shader program failed.
    #[error("failed to link program `{id}`: {source}")]
    Program {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// A task dropped its completion handle without signalling it.
    #[error("task `{0}` was dropped before it completed")]
    Abandoned(String),

    /// The executor refused to run a task.
    #[error("failed to spawn task `{0}`: executor is shut down")]
    Spawn(String),
}

impl Error {
    /// The identifier of the resource (or task label) the error is about.
    pub fn id(&self) -> &str {
        match self {
            Error::Fetch { id, .. }
            | Error::Decode { id, .. }
            | Error::Texture { id, .. }
            | Error::Program { id, .. } => id,
            Error::Abandoned(id) | Error::Spawn(id) => id,
        }
    }
}
