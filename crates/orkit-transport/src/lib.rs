mod algorithms;
mod error;
mod model;
mod sensitivity;
mod solve;

pub use algorithms::{
    Balanced, EPS, MAX_ITERATIONS, TraceStep, balance_problem, min_cost_method, northwest_corner,
    optimize_stepping_stone, total_cost, vogel_approximation,
};
pub use error::TransportError;
pub use model::{BIG_M, CellValue, TransportModel};
pub use sensitivity::{
    MostNegative, Sensitivity, compute_potentials, reduced_costs, transport_sensitivity,
};
pub use solve::{
    BalancedInfo, CompareInitials, CompareResponse, InitialSummary, Method, OptimalSummary,
    ResponseExtra, SingleResponse, SolveOptions, TransportResponse, TransportStatus,
    solve_transport,
};
