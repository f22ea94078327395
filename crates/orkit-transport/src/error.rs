use thiserror::Error;

/// Errors surfaced by the transportation solvers.
///
/// Only malformed input is an error; a degenerate allocation or an empty
/// cell without a closed cycle is handled inside the optimiser.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid model: {0}")]
    Model(String),
}
