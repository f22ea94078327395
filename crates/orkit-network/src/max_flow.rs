use std::collections::VecDeque;

use tracing::debug;

use crate::error::NetworkError;
use crate::graph::{FLOW_EPS, FlowEntry, Residual};
use crate::model::NetworkModel;

/// Edmonds-Karp maximum flow from `source` to `sink`.
///
/// BFS finds the shortest augmenting path in the residual network, the
/// bottleneck residual is pushed along it, and the loop ends when the sink
/// is no longer reachable. Undirected models mirror every capacity on both
/// orientations before the algorithm runs.
pub fn edmonds_karp(
    model: &NetworkModel,
    source: &str,
    sink: &str,
) -> Result<(f64, Vec<FlowEntry>), NetworkError> {
    let src = model.node_index(source)?;
    let dst = model.node_index(sink)?;

    let mut g = Residual::from_model(model);
    let n = g.node_count();
    let mut max_flow = 0.0;

    loop {
        // BFS over arcs with remaining residual capacity.
        let mut parent_arc: Vec<Option<usize>> = vec![None; n];
        let mut seen = vec![false; n];
        seen[src] = true;
        let mut queue = VecDeque::from([src]);

        'bfs: while let Some(u) = queue.pop_front() {
            for &arc in &g.adj[u] {
                let v = g.to[arc];
                if !seen[v] && g.residual(arc) > FLOW_EPS {
                    seen[v] = true;
                    parent_arc[v] = Some(arc);
                    if v == dst {
                        break 'bfs;
                    }
                    queue.push_back(v);
                }
            }
        }

        if !seen[dst] {
            break;
        }

        // Predecessor chain from sink back to source.
        let mut path = Vec::new();
        let mut v = dst;
        while v != src {
            let Some(arc) = parent_arc[v] else { break };
            path.push(arc);
            v = g.tail(arc);
        }

        let bottleneck = path
            .iter()
            .map(|&arc| g.residual(arc))
            .fold(f64::INFINITY, f64::min);
        for &arc in &path {
            g.push(arc, bottleneck);
        }

        debug!(bottleneck, total = max_flow + bottleneck, "augmenting path");
        max_flow += bottleneck;
    }

    Ok((max_flow, g.positive_flows(&model.nodes)))
}
