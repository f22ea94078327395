use thiserror::Error;

/// Errors surfaced by the network solvers.
///
/// `InfeasibleFlow` is intercepted by the dispatcher and turned into a
/// well-formed response; only `Model` reaches the boundary as a fault.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid model: {0}")]
    Model(String),

    #[error("no augmenting path: demand cannot be satisfied with the given capacities")]
    InfeasibleFlow,
}
