use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// A weighted arc. `weight` drives shortest path and spanning tree,
/// `capacity` and `cost` drive the flow algorithms.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub u: String,
    pub v: String,
    pub capacity: f64,
    pub cost: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeDto {
    u: String,
    v: String,
    #[serde(default)]
    capacity: Option<f64>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    w: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct NetworkModelDto {
    #[serde(default)]
    nodes: Vec<String>,
    #[serde(default)]
    edges: Vec<EdgeDto>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    sink: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    demand: Option<f64>,
    #[serde(default)]
    directed: Option<bool>,
}

/// A graph over string node identifiers.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
    pub source: Option<String>,
    pub sink: Option<String>,
    pub demand: f64,
    pub directed: bool,
}

impl NetworkModel {
    /// Builds and validates a model from a JSON value.
    ///
    /// `weight` falls back to `w` and then `cost` when absent; `target` is
    /// accepted as an alias for `sink`. Validation requires non-empty node
    /// and edge lists, unique node ids, and declared edge endpoints.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, NetworkError> {
        if !value.is_object() {
            return Err(NetworkError::Model("model must be a JSON object".to_string()));
        }
        let dto: NetworkModelDto = serde_json::from_value(value.clone())
            .map_err(|e| NetworkError::Model(e.to_string()))?;

        let edges = dto
            .edges
            .into_iter()
            .map(|e| {
                let cost = e.cost.unwrap_or(0.0);
                Edge {
                    weight: e.weight.or(e.w).unwrap_or(cost),
                    capacity: e.capacity.unwrap_or(0.0),
                    cost,
                    u: e.u,
                    v: e.v,
                }
            })
            .collect();

        let model = NetworkModel {
            nodes: dto.nodes,
            edges,
            source: dto.source,
            sink: dto.sink.or(dto.target),
            demand: dto.demand.unwrap_or(0.0),
            directed: dto.directed.unwrap_or(true),
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), NetworkError> {
        if self.nodes.is_empty() {
            return Err(NetworkError::Model(
                "'nodes' is required and must be non-empty".to_string(),
            ));
        }
        let node_set: HashSet<&str> = self.nodes.iter().map(String::as_str).collect();
        if node_set.len() != self.nodes.len() {
            return Err(NetworkError::Model("'nodes' contains duplicates".to_string()));
        }
        if self.edges.is_empty() {
            return Err(NetworkError::Model(
                "'edges' is required and must be non-empty".to_string(),
            ));
        }
        for (i, e) in self.edges.iter().enumerate() {
            if !node_set.contains(e.u.as_str()) || !node_set.contains(e.v.as_str()) {
                return Err(NetworkError::Model(format!(
                    "edge {} references unknown node: {}->{}",
                    i, e.u, e.v
                )));
            }
        }
        Ok(())
    }

    /// Index of a node id, or a model error naming it.
    pub(crate) fn node_index(&self, name: &str) -> Result<usize, NetworkError> {
        self.nodes
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| NetworkError::Model(format!("unknown node: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn weight_falls_back_to_w_then_cost() {
        let value = json!({
            "nodes": ["a", "b", "c"],
            "edges": [
                {"u": "a", "v": "b", "weight": 5, "cost": 1},
                {"u": "b", "v": "c", "w": 4, "cost": 1},
                {"u": "a", "v": "c", "cost": 3},
            ],
        });
        let model = NetworkModel::from_value(&value).unwrap();
        assert_eq!(model.edges[0].weight, 5.0);
        assert_eq!(model.edges[1].weight, 4.0);
        assert_eq!(model.edges[2].weight, 3.0);
        assert!(model.directed);
    }

    #[test]
    fn target_aliases_sink() {
        let value = json!({
            "nodes": ["a", "b"],
            "edges": [{"u": "a", "v": "b", "weight": 1}],
            "source": "a",
            "target": "b",
            "directed": false,
        });
        let model = NetworkModel::from_value(&value).unwrap();
        assert_eq!(model.sink.as_deref(), Some("b"));
        assert!(!model.directed);
    }

    #[test]
    fn rejects_unknown_edge_endpoint() {
        let value = json!({
            "nodes": ["a", "b"],
            "edges": [{"u": "a", "v": "z", "weight": 1}],
        });
        let err = NetworkModel::from_value(&value).unwrap_err();
        assert!(err.to_string().contains("unknown node"));
    }

    #[test]
    fn rejects_duplicate_nodes() {
        let value = json!({
            "nodes": ["a", "a"],
            "edges": [{"u": "a", "v": "a", "weight": 1}],
        });
        assert!(NetworkModel::from_value(&value).is_err());
    }

    #[test]
    fn rejects_empty_edge_list() {
        let value = json!({ "nodes": ["a"], "edges": [] });
        assert!(NetworkModel::from_value(&value).is_err());
    }
}
