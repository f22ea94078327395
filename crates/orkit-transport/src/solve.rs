use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::algorithms::{
    Balanced, MAX_ITERATIONS, TraceStep, balance_problem, min_cost_method, northwest_corner,
    optimize_stepping_stone, total_cost, vogel_approximation,
};
use crate::error::TransportError;
use crate::model::TransportModel;
use crate::sensitivity::{Sensitivity, transport_sensitivity};

/// Initial-solution / optimisation selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    Auto,
    #[serde(alias = "nw")]
    Northwest,
    #[serde(alias = "least_cost")]
    MinCost,
    Vogel,
    Optimize,
    Compare,
}

/// Options accepted alongside a transportation request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    pub compare_all: Option<bool>,
    pub optimize: Option<bool>,
    pub max_iterations: Option<usize>,
    pub trace: Option<bool>,
    pub trace_limit: Option<usize>,
    pub sensitivity: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransportStatus {
    #[serde(rename = "OPTIMAL")]
    Optimal,
    #[serde(rename = "FEASIBLE")]
    Feasible,
}

/// Dimensions of the balanced problem plus which dummy line was added.
#[derive(Debug, Clone, Serialize)]
pub struct BalancedInfo {
    pub added_dummy_origin: bool,
    pub added_dummy_destination: bool,
    pub rows: usize,
    pub cols: usize,
}

impl BalancedInfo {
    fn from_balanced(bal: &Balanced) -> Self {
        Self {
            added_dummy_origin: bal.added_dummy_origin,
            added_dummy_destination: bal.added_dummy_destination,
            rows: bal.supply.len(),
            cols: bal.demand.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseExtra {
    pub balanced: BalancedInfo,
}

/// One initial allocation in compare mode.
#[derive(Debug, Clone, Serialize)]
pub struct InitialSummary {
    pub method: String,
    pub total_cost: f64,
    #[serde(rename = "has_M")]
    pub has_m: bool,
    pub allocation: Vec<Vec<f64>>,
}

fn pack(name: &str, alloc: Vec<Vec<f64>>, costs: &[Vec<f64>]) -> InitialSummary {
    let (z, has_m) = total_cost(&alloc, costs);
    InitialSummary {
        method: name.to_string(),
        total_cost: z,
        has_m,
        allocation: alloc,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareInitials {
    pub northwest: InitialSummary,
    pub min_cost: InitialSummary,
    pub vogel: InitialSummary,
}

/// The optimised allocation in compare mode.
#[derive(Debug, Clone, Serialize)]
pub struct OptimalSummary {
    pub method: String,
    pub total_cost: f64,
    #[serde(rename = "has_M")]
    pub has_m: bool,
    pub allocation: Vec<Vec<f64>>,
    pub iterations: usize,
    pub started_from: String,
    pub status: TransportStatus,
    pub trace: Vec<TraceStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareResponse {
    pub status: TransportStatus,
    pub compare: bool,
    pub initials: CompareInitials,
    pub optimal: OptimalSummary,
    pub extra: ResponseExtra,
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleResponse {
    pub status: TransportStatus,
    pub method_used: String,
    pub iterations: usize,
    pub total_cost: f64,
    #[serde(rename = "has_M")]
    pub has_m: bool,
    pub allocation: Vec<Vec<f64>>,
    pub extra: ResponseExtra,
    pub trace: Vec<TraceStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Sensitivity>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TransportResponse {
    Compare(Box<CompareResponse>),
    Single(Box<SingleResponse>),
}

fn parse_method(value: Option<&Value>) -> Result<Method, TransportError> {
    match value {
        None => Ok(Method::Auto),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|_| TransportError::Model(format!("unknown method: {v}"))),
    }
}

/// Solves a `{ method, model, options }` transportation request.
///
/// The model may sit under a `model` key or be the request itself. `auto`
/// builds a Vogel start and optimises it; the explicit initial methods skip
/// optimisation unless `options.optimize` asks for it; `compare` runs all
/// three initials and optimises the cheapest.
pub fn solve_transport(request: &Value) -> Result<TransportResponse, TransportError> {
    let obj = request
        .as_object()
        .ok_or_else(|| TransportError::Model("request must be a JSON object".to_string()))?;

    let method = parse_method(obj.get("method"))?;
    let model_value = obj.get("model").unwrap_or(request);
    let model = TransportModel::from_value(model_value)?;
    let bal = balance_problem(&model.supply, &model.demand, &model.costs);

    let opts: SolveOptions = match obj.get("options") {
        Some(v) if v.is_object() => serde_json::from_value(v.clone())
            .map_err(|e| TransportError::Model(format!("invalid options: {e}")))?,
        _ => SolveOptions::default(),
    };

    let compare_all = opts.compare_all.unwrap_or(method == Method::Compare);
    let do_opt = opts.optimize.unwrap_or(matches!(
        method,
        Method::Auto | Method::Optimize | Method::Compare
    ));
    let max_it = opts.max_iterations.unwrap_or(MAX_ITERATIONS);
    let trace_enabled = opts.trace.unwrap_or(true);
    let trace_limit = opts.trace_limit.unwrap_or(50);
    let want_sensitivity = opts.sensitivity.unwrap_or(false);

    let status = if do_opt {
        TransportStatus::Optimal
    } else {
        TransportStatus::Feasible
    };
    let extra = ResponseExtra {
        balanced: BalancedInfo::from_balanced(&bal),
    };

    if compare_all {
        let initials = CompareInitials {
            northwest: pack("northwest", northwest_corner(&bal.supply, &bal.demand), &bal.costs),
            min_cost: pack(
                "min_cost",
                min_cost_method(&bal.supply, &bal.demand, &bal.costs),
                &bal.costs,
            ),
            vogel: pack(
                "vogel",
                vogel_approximation(&bal.supply, &bal.demand, &bal.costs),
                &bal.costs,
            ),
        };

        // Optimise from the cheapest initial; first wins ties.
        let candidates = [
            ("northwest", &initials.northwest),
            ("min_cost", &initials.min_cost),
            ("vogel", &initials.vogel),
        ];
        let mut best = candidates[0];
        for cand in &candidates[1..] {
            if cand.1.total_cost < best.1.total_cost {
                best = *cand;
            }
        }
        let (started_from, start) = (best.0.to_string(), best.1.allocation.clone());

        let (final_alloc, iterations, trace_steps) = if do_opt {
            optimize_stepping_stone(&start, &bal.costs, max_it, trace_enabled, trace_limit)
        } else {
            (start, 0, Vec::new())
        };

        let (z, has_m) = total_cost(&final_alloc, &bal.costs);
        let optimal = OptimalSummary {
            method: "optimal".to_string(),
            total_cost: z,
            has_m,
            allocation: final_alloc,
            iterations,
            started_from,
            status,
            trace: trace_steps,
        };

        return Ok(TransportResponse::Compare(Box::new(CompareResponse {
            status,
            compare: true,
            initials,
            optimal,
            extra,
        })));
    }

    let (mut alloc, initial) = match method {
        Method::Northwest => (northwest_corner(&bal.supply, &bal.demand), "northwest"),
        Method::MinCost => (
            min_cost_method(&bal.supply, &bal.demand, &bal.costs),
            "min_cost",
        ),
        // `compare` with compare_all disabled degrades to a Vogel start.
        Method::Auto | Method::Vogel | Method::Optimize | Method::Compare => (
            vogel_approximation(&bal.supply, &bal.demand, &bal.costs),
            "vogel",
        ),
    };

    let mut iterations = 0;
    let mut trace_steps = Vec::new();
    let mut method_used = initial.to_string();
    if do_opt {
        let (optimised, it, steps) =
            optimize_stepping_stone(&alloc, &bal.costs, max_it, trace_enabled, trace_limit);
        alloc = optimised;
        iterations = it;
        trace_steps = steps;
        method_used = format!("{initial}+optimize");
    }

    let (z, has_m) = total_cost(&alloc, &bal.costs);
    let sensitivity = want_sensitivity.then(|| transport_sensitivity(&bal.costs, &alloc));

    Ok(TransportResponse::Single(Box::new(SingleResponse {
        status,
        method_used,
        iterations,
        total_cost: z,
        has_m,
        allocation: alloc,
        extra,
        trace: trace_steps,
        sensitivity,
    })))
}
