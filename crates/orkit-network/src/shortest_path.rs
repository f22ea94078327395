use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::trace;

use crate::error::NetworkError;
use crate::model::NetworkModel;

/// Heap entry ordered so the smallest distance pops first; ties fall back
/// to the node index to keep the ordering total.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapItem {
    dist: f64,
    node: usize,
}

impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra over non-negative `weight`, stopping early once the target is
/// settled. Stale heap entries are skipped by comparing against the best
/// known distance (lazy deletion).
///
/// Returns distances and predecessors keyed by node id; unreachable nodes
/// keep an infinite distance and no predecessor.
pub fn dijkstra(
    model: &NetworkModel,
    source: &str,
    target: &str,
) -> Result<(HashMap<String, f64>, HashMap<String, Option<String>>), NetworkError> {
    if let Some(e) = model.edges.iter().find(|e| e.weight < 0.0) {
        return Err(NetworkError::Model(format!(
            "Dijkstra requires non-negative weights ({}->{} has {})",
            e.u, e.v, e.weight
        )));
    }
    let src = model.node_index(source)?;
    let dst = model.node_index(target)?;

    let n = model.nodes.len();
    let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for e in &model.edges {
        let u = model.node_index(&e.u)?;
        let v = model.node_index(&e.v)?;
        adj[u].push((v, e.weight));
        if !model.directed {
            adj[v].push((u, e.weight));
        }
    }

    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    dist[src] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(HeapItem { dist: 0.0, node: src });

    while let Some(HeapItem { dist: d, node: u }) = heap.pop() {
        if d != dist[u] {
            continue;
        }
        if u == dst {
            break;
        }
        for &(v, w) in &adj[u] {
            let nd = d + w;
            if nd < dist[v] {
                trace!(node = %model.nodes[v], dist = nd, "dijkstra relax");
                dist[v] = nd;
                prev[v] = Some(u);
                heap.push(HeapItem { dist: nd, node: v });
            }
        }
    }

    let dist_map = model
        .nodes
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), dist[i]))
        .collect();
    let prev_map = model
        .nodes
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), prev[i].map(|p| model.nodes[p].clone())))
        .collect();
    Ok((dist_map, prev_map))
}

/// Walks the predecessor map back from `target`. Returns an empty path when
/// the target was never reached.
pub fn reconstruct_path(
    prev: &HashMap<String, Option<String>>,
    source: &str,
    target: &str,
) -> Vec<String> {
    if source == target {
        return vec![source.to_string()];
    }
    let mut path = Vec::new();
    let mut cur = Some(target.to_string());
    while let Some(node) = cur {
        path.push(node.clone());
        if node == source {
            break;
        }
        cur = prev.get(&node).cloned().flatten();
    }
    path.reverse();
    if path.first().map(String::as_str) != Some(source) {
        return Vec::new();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn triangle() -> NetworkModel {
        NetworkModel::from_value(&json!({
            "nodes": ["A", "B", "C"],
            "edges": [
                {"u": "A", "v": "B", "weight": 5},
                {"u": "A", "v": "C", "weight": 2},
                {"u": "C", "v": "B", "weight": 1},
            ],
            "directed": true,
        }))
        .unwrap()
    }

    #[test]
    fn takes_the_cheaper_detour() {
        let model = triangle();
        let (dist, prev) = dijkstra(&model, "A", "B").unwrap();
        assert_eq!(dist["A"], 0.0);
        assert_eq!(dist["B"], 3.0);
        assert_eq!(reconstruct_path(&prev, "A", "B"), vec!["A", "C", "B"]);
    }

    #[test]
    fn unreachable_target_keeps_infinite_distance() {
        let model = NetworkModel::from_value(&json!({
            "nodes": ["A", "B", "C"],
            "edges": [{"u": "B", "v": "C", "weight": 1}],
        }))
        .unwrap();
        let (dist, prev) = dijkstra(&model, "A", "C").unwrap();
        assert!(dist["C"].is_infinite());
        assert!(reconstruct_path(&prev, "A", "C").is_empty());
    }

    #[test]
    fn undirected_edges_work_both_ways() {
        let model = NetworkModel::from_value(&json!({
            "nodes": ["A", "B"],
            "edges": [{"u": "B", "v": "A", "weight": 7}],
            "directed": false,
        }))
        .unwrap();
        let (dist, _) = dijkstra(&model, "A", "B").unwrap();
        assert_eq!(dist["B"], 7.0);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let model = NetworkModel::from_value(&json!({
            "nodes": ["A", "B"],
            "edges": [{"u": "A", "v": "B", "weight": -1}],
        }))
        .unwrap();
        assert!(matches!(
            dijkstra(&model, "A", "B"),
            Err(NetworkError::Model(_))
        ));
    }

    #[test]
    fn source_equals_target() {
        let model = triangle();
        let (dist, prev) = dijkstra(&model, "A", "A").unwrap();
        assert_eq!(dist["A"], 0.0);
        assert_eq!(reconstruct_path(&prev, "A", "A"), vec!["A"]);
    }
}
