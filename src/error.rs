use thiserror::Error;

use crate::protocol::traits::WriteError;

/// Boxed error returned by the offset and metadata collaborators.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot fetch {kind} offsets for topic '{topic}': {source}")]
    OffsetFetch {
        topic: String,
        kind: OffsetKind,
        #[source]
        source: SourceError,
    },

    #[error("Cannot encode member data: {0}")]
    Encode(#[from] WriteError),

    #[error(
        "Rebalance started at generation {started} was superseded by generation {current}"
    )]
    Superseded { started: i32, current: i32 },
}

/// Which offset lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetKind {
    Beginning,
    End,
    Committed,
}

impl std::fmt::Display for OffsetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginning => write!(f, "beginning"),
            Self::End => write!(f, "end"),
            Self::Committed => write!(f, "committed"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
