mod big_m;
mod dual;
mod error;
mod model;
mod simplex;
mod simplex_basic;
mod solve;
mod two_phase;

pub use big_m::{BigMBuild, DEFAULT_M, build_big_m_tableau, solve_big_m};
pub use dual::{DualMapping, build_dual, shadow_prices};
pub use error::LpError;
pub use model::{
    Constraint, LpModel, LpSolution, Relation, Sense, SolveInfo, Status, TableauHistory,
};
pub use simplex::{
    EPS, IterationRecord, MAX_ITERATIONS, PivotStep, Tableau, extract_basic_solution, simplex_max,
};
pub use simplex_basic::{BasicBuild, build_basic_tableau, solve_simplex_basic};
pub use solve::{
    DualInfo, LpRequest, LpResponse, Method, can_use_basic_simplex, choose_method, solve_lp,
    solve_request,
};
pub use two_phase::{TwoPhaseBuild, build_phase1_tableau, solve_two_phase};
