//! Error types for marker construction

use thiserror::Error;

/// Errors raised while turning a raw marker (name, arguments) into a [`Marker`](crate::Marker)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// The marker has no name
    #[error("marker name must not be empty")]
    EmptyName,

    /// An argument has the wrong type
    #[error("marker '{marker}' expects {expected} for argument '{argument}'")]
    InvalidArgument {
        /// The marker being parsed
        marker: String,
        /// The positional index (`args[N]`) or keyword name
        argument: String,
        /// Human readable description of the accepted type
        expected: &'static str,
    },

    /// The marker does not accept this argument at all
    #[error("marker '{marker}' does not accept argument '{argument}'")]
    UnexpectedArgument {
        /// The marker being parsed
        marker: String,
        /// The positional index (`args[N]`) or keyword name
        argument: String,
    },
}

impl MarkerError {
    /// Create an invalid argument error
    pub fn invalid_argument(
        marker: impl Into<String>,
        argument: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidArgument {
            marker: marker.into(),
            argument: argument.into(),
            expected,
        }
    }

    /// Create an unexpected argument error
    pub fn unexpected_argument(marker: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::UnexpectedArgument {
            marker: marker.into(),
            argument: argument.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MarkerError>;
