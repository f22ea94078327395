use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NetworkError;
use crate::graph::{FLOW_EPS, FlowEntry};
use crate::max_flow::edmonds_karp;
use crate::min_cost_flow::min_cost_flow_ssap;
use crate::model::NetworkModel;
use crate::mst::kruskal_mst;
use crate::shortest_path::{dijkstra, reconstruct_path};

/// Network method selection. Missing method defaults to shortest path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    #[serde(alias = "shortest")]
    ShortestPath,
    #[serde(alias = "minimum_spanning_tree")]
    Mst,
    MaxFlow,
    #[serde(alias = "min_cost")]
    MinCostFlow,
}

/// Nodes and `"u->v"` edge keys for the caller to highlight.
#[derive(Debug, Clone, Serialize)]
pub struct Highlight {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

fn edge_key(u: &str, v: &str) -> String {
    format!("{u}->{v}")
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortestPathResponse {
    pub method: String,
    pub source: String,
    pub target: String,
    pub distance: Option<f64>,
    pub path_nodes: Vec<String>,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, Serialize)]
pub struct MstEdge {
    pub u: String,
    pub v: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MstResponse {
    pub method: String,
    pub total_weight: f64,
    pub edges: Vec<MstEdge>,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaxFlowResponse {
    pub method: String,
    pub source: String,
    pub sink: String,
    pub max_flow: f64,
    pub flows: Vec<FlowEntry>,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, Serialize)]
pub struct MinCostFlowResponse {
    pub method: String,
    pub source: String,
    pub sink: String,
    pub demand: f64,
    pub sent: f64,
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<Vec<FlowEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NetworkResponse {
    ShortestPath(ShortestPathResponse),
    Mst(MstResponse),
    MaxFlow(MaxFlowResponse),
    MinCostFlow(MinCostFlowResponse),
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Solves a `{ method, model }` network request.
///
/// The model may sit under a `model` key or be the request itself; for
/// shortest path the source/target may also be given at the request level.
/// Infeasible min-cost flow comes back as a well-formed response with an
/// `error` field rather than a fault.
pub fn solve_network(request: &Value) -> Result<NetworkResponse, NetworkError> {
    let obj = request
        .as_object()
        .ok_or_else(|| NetworkError::Model("request must be a JSON object".to_string()))?;

    let method: Method = match obj.get("method") {
        None => Method::default(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|_| NetworkError::Model(format!("unknown method: {v}")))?,
    };
    let model_value = obj.get("model").unwrap_or(request);
    let model = NetworkModel::from_value(model_value)?;

    match method {
        Method::ShortestPath => {
            let source = model
                .source
                .clone()
                .or_else(|| string_field(obj, "source"))
                .ok_or_else(|| {
                    NetworkError::Model("shortest path requires 'source' and 'sink/target'".to_string())
                })?;
            let target = model
                .sink
                .clone()
                .or_else(|| string_field(obj, "target"))
                .or_else(|| string_field(obj, "sink"))
                .ok_or_else(|| {
                    NetworkError::Model("shortest path requires 'source' and 'sink/target'".to_string())
                })?;

            let (dist, prev) = dijkstra(&model, &source, &target)?;
            let path_nodes = reconstruct_path(&prev, &source, &target);
            let path_edges = path_nodes
                .windows(2)
                .map(|w| edge_key(&w[0], &w[1]))
                .collect();
            let distance = dist.get(&target).copied().filter(|d| d.is_finite());

            Ok(NetworkResponse::ShortestPath(ShortestPathResponse {
                method: "shortest_path".to_string(),
                source,
                target,
                distance,
                path_nodes: path_nodes.clone(),
                highlight: Highlight {
                    nodes: path_nodes,
                    edges: path_edges,
                },
            }))
        }

        Method::Mst => {
            let (total, edges) = kruskal_mst(&model)?;
            let mut nodes = Vec::new();
            for e in &edges {
                for name in [&e.u, &e.v] {
                    if !nodes.contains(name) {
                        nodes.push(name.clone());
                    }
                }
            }
            let mut edge_keys: Vec<String> =
                edges.iter().map(|e| edge_key(&e.u, &e.v)).collect();
            edge_keys.extend(edges.iter().map(|e| edge_key(&e.v, &e.u)));

            Ok(NetworkResponse::Mst(MstResponse {
                method: "mst".to_string(),
                total_weight: total,
                edges: edges
                    .iter()
                    .map(|e| MstEdge {
                        u: e.u.clone(),
                        v: e.v.clone(),
                        weight: e.weight,
                    })
                    .collect(),
                highlight: Highlight {
                    nodes,
                    edges: edge_keys,
                },
            }))
        }

        Method::MaxFlow => {
            let (source, sink) = match (&model.source, &model.sink) {
                (Some(s), Some(t)) => (s.clone(), t.clone()),
                _ => {
                    return Err(NetworkError::Model(
                        "max flow requires 'source' and 'sink'".to_string(),
                    ));
                }
            };
            let (value, flows) = edmonds_karp(&model, &source, &sink)?;
            let edges = flows
                .iter()
                .filter(|f| f.flow > FLOW_EPS)
                .map(|f| edge_key(&f.u, &f.v))
                .collect();

            Ok(NetworkResponse::MaxFlow(MaxFlowResponse {
                method: "max_flow".to_string(),
                source,
                sink,
                max_flow: value,
                flows,
                highlight: Highlight {
                    nodes: model.nodes.clone(),
                    edges,
                },
            }))
        }

        Method::MinCostFlow => {
            let (source, sink) = match (&model.source, &model.sink) {
                (Some(s), Some(t)) => (s.clone(), t.clone()),
                _ => {
                    return Err(NetworkError::Model(
                        "min-cost flow requires 'source' and 'sink'".to_string(),
                    ));
                }
            };
            if model.demand <= 0.0 {
                return Err(NetworkError::Model(
                    "min-cost flow requires 'demand' > 0".to_string(),
                ));
            }

            match min_cost_flow_ssap(&model, &source, &sink, model.demand) {
                Ok((sent, total_cost, flows)) => {
                    let edges = flows
                        .iter()
                        .filter(|f| f.flow > FLOW_EPS)
                        .map(|f| edge_key(&f.u, &f.v))
                        .collect();
                    Ok(NetworkResponse::MinCostFlow(MinCostFlowResponse {
                        method: "min_cost_flow".to_string(),
                        source,
                        sink,
                        demand: model.demand,
                        sent,
                        total_cost: Some(total_cost),
                        flows: Some(flows),
                        highlight: Some(Highlight {
                            nodes: model.nodes.clone(),
                            edges,
                        }),
                        error: None,
                    }))
                }
                Err(NetworkError::InfeasibleFlow) => {
                    Ok(NetworkResponse::MinCostFlow(MinCostFlowResponse {
                        method: "min_cost_flow".to_string(),
                        source,
                        sink,
                        demand: model.demand,
                        sent: 0.0,
                        total_cost: None,
                        flows: None,
                        highlight: None,
                        error: Some(NetworkError::InfeasibleFlow.to_string()),
                    }))
                }
                Err(e) => Err(e),
            }
        }
    }
}
