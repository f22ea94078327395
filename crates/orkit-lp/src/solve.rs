use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::big_m::solve_big_m;
use crate::dual::{build_dual, shadow_prices};
use crate::error::LpError;
use crate::model::{LpModel, LpSolution, Relation, SolveInfo, Status};
use crate::simplex_basic::solve_simplex_basic;
use crate::two_phase::solve_two_phase;

/// Solver selection for [`solve_lp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    Auto,
    Simplex,
    TwoPhase,
    BigM,
    Dual,
}

/// The plain simplex only applies when every constraint is `<=` with a
/// non-negative right-hand side.
pub fn can_use_basic_simplex(model: &LpModel) -> bool {
    model
        .constraints
        .iter()
        .all(|c| c.op == Relation::Le && c.b >= 0.0)
}

/// Automatic selection: basic simplex when it applies, two-phase otherwise.
pub fn choose_method(model: &LpModel) -> Method {
    if can_use_basic_simplex(model) {
        Method::Simplex
    } else {
        Method::TwoPhase
    }
}

/// Dispatches a model to the requested solver.
///
/// Forcing `simplex` on a model it cannot handle falls back to two-phase
/// with an explanatory message instead of failing. `dual` builds the dual,
/// solves it by two-phase and attaches the variable mapping to the result.
pub fn solve_lp(model: &LpModel, method: Method) -> Result<LpSolution, LpError> {
    model.validate()?;
    match method {
        Method::Auto => {
            if can_use_basic_simplex(model) {
                solve_simplex_basic(model)
            } else {
                solve_two_phase(model)
            }
        }
        Method::Simplex => {
            if !can_use_basic_simplex(model) {
                let mut res = solve_two_phase(model)?;
                res.message =
                    "basic simplex does not apply (>=, = or negative RHS present); solved with two-phase"
                        .to_string();
                res.method_used = "two_phase".to_string();
                return Ok(res);
            }
            solve_simplex_basic(model)
        }
        Method::TwoPhase => solve_two_phase(model),
        Method::BigM => solve_big_m(model),
        Method::Dual => {
            let (dual_model, mapping) = build_dual(model);
            let mut res = solve_two_phase(&dual_model)?;
            res.method_used = "dual(two_phase)".to_string();
            let extra = res.extra.get_or_insert_with(SolveInfo::empty);
            extra.dual_mapping = Some(mapping);
            extra.dual_model_name = Some(dual_model.name.clone());
            Ok(res)
        }
    }
}

/// An LP request as received at the JSON boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct LpRequest {
    pub model: LpModel,
    #[serde(default)]
    pub method: Method,
}

/// Dual side of an LP response: the solved dual with reconstructed shadow
/// prices, computed best-effort for every request.
#[derive(Debug, Clone, Serialize)]
pub struct DualInfo {
    pub status: Status,
    pub x: Vec<f64>,
    pub objective_value: Option<f64>,
    pub method_used: String,
    pub shadow_prices: Option<Vec<f64>>,
}

/// Full LP response envelope. Non-finite objective values are already
/// replaced by `None` so the serialised JSON carries `null`.
#[derive(Debug, Clone, Serialize)]
pub struct LpResponse {
    pub status: Status,
    pub x: Vec<f64>,
    pub objective_value: Option<f64>,
    pub iterations: usize,
    pub message: String,
    pub method_used: String,
    pub slacks: Option<Vec<f64>>,
    pub dual: Option<DualInfo>,
    pub tableau: Option<Vec<Vec<f64>>>,
    pub basis: Option<Vec<Option<usize>>>,
    pub var_names: Option<Vec<String>>,
    pub row0: Option<Vec<f64>>,
    pub basic_vars: Option<Vec<String>>,
    pub nonbasic_vars: Option<Vec<String>>,
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Per-constraint slack at the optimum: `b - a.x` for `<=`, `a.x - b` for
/// `>=`, and zero for equalities.
fn constraint_slacks(model: &LpModel, x: &[f64]) -> Vec<f64> {
    model
        .constraints
        .iter()
        .map(|cst| {
            let ax: f64 = cst.a.iter().zip(x).map(|(a, xi)| a * xi).sum();
            match cst.op {
                Relation::Le => cst.b - ax,
                Relation::Ge => ax - cst.b,
                Relation::Eq => 0.0,
            }
        })
        .collect()
}

fn dual_info(model: &LpModel) -> Option<DualInfo> {
    let (dual_model, mapping) = build_dual(model);
    let dual_res = solve_two_phase(&dual_model).ok()?;
    let prices = (dual_res.status == Status::Optimal)
        .then(|| shadow_prices(&mapping, &dual_res.x));
    Some(DualInfo {
        status: dual_res.status,
        x: dual_res.x,
        objective_value: finite(dual_res.objective_value),
        method_used: dual_res.method_used,
        shadow_prices: prices,
    })
}

/// Solves a `{ model, method }` request and assembles the response envelope:
/// solution fields plus slacks, the solved dual with shadow prices, and the
/// final-tableau details when available.
///
/// A request with `method = "dual"` reports the primal solved by two-phase;
/// the dual side is carried in the `dual` field either way.
pub fn solve_request(request: &Value) -> Result<LpResponse, LpError> {
    let req: LpRequest =
        serde_json::from_value(request.clone()).map_err(|e| LpError::Model(e.to_string()))?;
    req.model.validate()?;

    let primal = if req.method == Method::Dual {
        solve_lp(&req.model, Method::TwoPhase)?
    } else {
        solve_lp(&req.model, req.method)?
    };

    let slacks = (primal.status == Status::Optimal)
        .then(|| constraint_slacks(&req.model, &primal.x));
    let dual = dual_info(&req.model);

    let (tableau, basis, var_names, row0, basic_vars, nonbasic_vars) = match primal.extra {
        Some(info) => (
            Some(info.final_tableau),
            Some(info.basis),
            Some(info.var_names),
            Some(info.row0),
            Some(info.basic_vars),
            Some(info.nonbasic_vars),
        ),
        None => (None, None, None, None, None, None),
    };

    Ok(LpResponse {
        status: primal.status,
        x: primal.x,
        objective_value: finite(primal.objective_value),
        iterations: primal.iterations,
        message: primal.message,
        method_used: primal.method_used,
        slacks,
        dual,
        tableau,
        basis,
        var_names,
        row0,
        basic_vars,
        nonbasic_vars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, Sense};
    use serde_json::json;

    fn all_le_model() -> LpModel {
        LpModel {
            name: "demo_le".to_string(),
            sense: Sense::Max,
            c: vec![3.0, 5.0],
            constraints: vec![
                Constraint { a: vec![1.0, 0.0], op: Relation::Le, b: 4.0 },
                Constraint { a: vec![0.0, 2.0], op: Relation::Le, b: 12.0 },
                Constraint { a: vec![3.0, 2.0], op: Relation::Le, b: 18.0 },
            ],
        }
    }

    #[test]
    fn auto_uses_simplex_for_all_le() {
        let res = solve_lp(&all_le_model(), Method::Auto).unwrap();
        assert_eq!(res.status, Status::Optimal);
        assert_eq!(res.method_used, "simplex");
        assert!((res.objective_value - 36.0).abs() < 1e-6);
    }

    #[test]
    fn forced_simplex_falls_back_to_two_phase() {
        let model = LpModel {
            name: "mixed".to_string(),
            sense: Sense::Max,
            c: vec![1.0, 1.0],
            constraints: vec![
                Constraint { a: vec![1.0, 1.0], op: Relation::Ge, b: 2.0 },
                Constraint { a: vec![1.0, 0.0], op: Relation::Le, b: 3.0 },
                Constraint { a: vec![0.0, 1.0], op: Relation::Le, b: 3.0 },
            ],
        };
        let res = solve_lp(&model, Method::Simplex).unwrap();
        assert_eq!(res.method_used, "two_phase");
        assert!(res.message.contains("two-phase"));
    }

    #[test]
    fn big_m_scenario_is_optimal_or_unbounded() {
        let model = LpModel {
            name: "bigm".to_string(),
            sense: Sense::Max,
            c: vec![2.0, 1.0],
            constraints: vec![
                Constraint { a: vec![1.0, 1.0], op: Relation::Ge, b: 4.0 },
                Constraint { a: vec![1.0, 0.0], op: Relation::Le, b: 6.0 },
            ],
        };
        let res = solve_lp(&model, Method::BigM).unwrap();
        assert_eq!(res.method_used, "big_m");
        assert!(matches!(res.status, Status::Optimal | Status::Unbounded));
    }

    #[test]
    fn dual_method_attaches_mapping() {
        let model = LpModel {
            name: "dual_demo".to_string(),
            sense: Sense::Max,
            c: vec![3.0, 2.0],
            constraints: vec![
                Constraint { a: vec![2.0, 1.0], op: Relation::Le, b: 8.0 },
                Constraint { a: vec![1.0, 2.0], op: Relation::Ge, b: 4.0 },
            ],
        };
        let res = solve_lp(&model, Method::Dual).unwrap();
        assert!(matches!(
            res.status,
            Status::Optimal | Status::Infeasible | Status::Unbounded
        ));
        assert_eq!(res.method_used, "dual(two_phase)");
        let extra = res.extra.unwrap();
        assert!(extra.dual_mapping.is_some());
        assert_eq!(extra.dual_model_name.as_deref(), Some("DUAL(dual_demo)"));
    }

    #[test]
    fn request_envelope_carries_slacks_and_dual() {
        let request = json!({
            "method": "auto",
            "model": {
                "name": "demo_le",
                "sense": "max",
                "c": [3, 5],
                "constraints": [
                    {"a": [1, 0], "op": "<=", "b": 4},
                    {"a": [0, 2], "op": "<=", "b": 12},
                    {"a": [3, 2], "op": "<=", "b": 18},
                ]
            }
        });
        let res = solve_request(&request).unwrap();
        assert_eq!(res.status, Status::Optimal);
        assert!((res.objective_value.unwrap() - 36.0).abs() < 1e-6);
        // x = (2, 6): the first constraint has slack 2, the others bind.
        let slacks = res.slacks.unwrap();
        assert!((slacks[0] - 2.0).abs() < 1e-6);
        assert!(slacks[1].abs() < 1e-6);
        assert!(slacks[2].abs() < 1e-6);
        let dual = res.dual.unwrap();
        assert_eq!(dual.status, Status::Optimal);
        assert!((dual.objective_value.unwrap() - 36.0).abs() < 1e-6);
        assert!(dual.shadow_prices.is_some());
        assert!(res.tableau.is_some());
        assert!(res.row0.is_some());
    }

    #[test]
    fn request_with_unknown_method_is_a_model_error() {
        let request = json!({
            "method": "branch_and_bound",
            "model": {"sense": "max", "c": [1], "constraints": []}
        });
        assert!(matches!(
            solve_request(&request),
            Err(LpError::Model(_))
        ));
    }

    #[test]
    fn infeasible_request_still_produces_envelope() {
        let request = json!({
            "method": "two_phase",
            "model": {
                "sense": "min",
                "c": [1],
                "constraints": [
                    {"a": [1], "op": ">=", "b": 5},
                    {"a": [1], "op": "<=", "b": 3},
                ]
            }
        });
        let res = solve_request(&request).unwrap();
        assert_eq!(res.status, Status::Infeasible);
        // NaN objective sanitised to null.
        assert_eq!(res.objective_value, None);
        assert!(res.slacks.is_none());
    }
}
