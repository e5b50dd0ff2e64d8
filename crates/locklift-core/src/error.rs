use std::process::ExitStatus;

use thiserror::Error;

/// Typed failures raised while preparing an injected command.
///
/// Anything not listed here travels as a plain [`anyhow::Error`].
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The selected network has no entry in the `networks` table.
    #[error("Can't find configuration for {0} network!")]
    UnknownNetwork(String),
    /// A required option was absent from the parsed arguments.
    #[error("missing required option '--{0}'")]
    MissingOption(&'static str),
    /// The compiler process ran but reported failure.
    #[error("compiler '{program}' failed with status {status}")]
    CompilerFailed { program: String, status: ExitStatus },
}

impl LoaderError {
    /// True for failures that must end the process before any step runs.
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(self, Self::UnknownNetwork(_) | Self::MissingOption(_))
    }
}
