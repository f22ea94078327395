use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::error::NetworkError;
use crate::graph::{FLOW_EPS, FlowEntry, Residual};
use crate::model::NetworkModel;

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

/// Successive Shortest Augmenting Path min-cost flow with Johnson
/// potentials.
///
/// Each round runs Dijkstra over the residual network using reduced costs
/// `c + pi(u) - pi(v)` (non-negative once the potentials are valid),
/// updates the potentials by the found distances, and augments by the
/// smaller of the remaining demand and the path bottleneck. True costs are
/// accumulated from the original arc costs. An unreachable sink before the
/// demand is met is [`NetworkError::InfeasibleFlow`].
pub fn min_cost_flow_ssap(
    model: &NetworkModel,
    source: &str,
    sink: &str,
    demand: f64,
) -> Result<(f64, f64, Vec<FlowEntry>), NetworkError> {
    let src = model.node_index(source)?;
    let dst = model.node_index(sink)?;

    let mut g = Residual::from_model(model);
    let n = g.node_count();
    let mut potential = vec![0.0; n];

    let mut sent = 0.0;
    let mut total_cost = 0.0;

    while sent + FLOW_EPS < demand {
        // Dijkstra on reduced costs over arcs with residual capacity.
        let mut dist = vec![f64::INFINITY; n];
        let mut parent_arc: Vec<Option<usize>> = vec![None; n];
        dist[src] = 0.0;

        let mut heap = BinaryHeap::new();
        heap.push(HeapItem { dist: 0.0, node: src });

        while let Some(HeapItem { dist: d, node: u }) = heap.pop() {
            if d != dist[u] {
                continue;
            }
            for &arc in &g.adj[u] {
                if g.residual(arc) <= FLOW_EPS {
                    continue;
                }
                let v = g.to[arc];
                let rcost = g.cost[arc] + potential[u] - potential[v];
                let nd = d + rcost;
                if nd < dist[v] - 1e-15 {
                    dist[v] = nd;
                    parent_arc[v] = Some(arc);
                    heap.push(HeapItem { dist: nd, node: v });
                }
            }
        }

        if parent_arc[dst].is_none() {
            return Err(NetworkError::InfeasibleFlow);
        }

        for (node, d) in dist.iter().enumerate() {
            if d.is_finite() {
                potential[node] += d;
            }
        }

        // Augment by the demand still missing, capped by the bottleneck.
        let mut path = Vec::new();
        let mut v = dst;
        while v != src {
            let Some(arc) = parent_arc[v] else { break };
            path.push(arc);
            v = g.tail(arc);
        }

        let mut add = demand - sent;
        for &arc in &path {
            add = add.min(g.residual(arc));
        }
        for &arc in &path {
            g.push(arc, add);
            total_cost += add * g.cost[arc];
        }

        sent += add;
        debug!(sent, total_cost, "min-cost augmentation");
    }

    Ok((sent, total_cost, g.positive_flows(&model.nodes)))
}
