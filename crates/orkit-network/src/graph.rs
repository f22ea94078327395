use serde::Serialize;

use crate::model::NetworkModel;

/// Residual capacities below this are treated as exhausted.
pub(crate) const FLOW_EPS: f64 = 1e-12;

/// A positive flow on an original arc, reported back to callers.
#[derive(Debug, Clone, Serialize)]
pub struct FlowEntry {
    pub u: String,
    pub v: String,
    pub flow: f64,
}

/// Residual network over interned node indices.
///
/// Arcs are stored pairwise: arc `i` and its reverse `i ^ 1`. The reverse
/// arc carries zero capacity and negated cost, and flows are antisymmetric,
/// so the residual capacity of either direction is `cap - flow`.
#[derive(Debug, Clone)]
pub(crate) struct Residual {
    pub adj: Vec<Vec<usize>>,
    pub to: Vec<usize>,
    pub cap: Vec<f64>,
    pub cost: Vec<f64>,
    pub flow: Vec<f64>,
}

impl Residual {
    pub fn new(n: usize) -> Self {
        Self {
            adj: vec![Vec::new(); n],
            to: Vec::new(),
            cap: Vec::new(),
            cost: Vec::new(),
            flow: Vec::new(),
        }
    }

    /// Builds the residual network from a model's `capacity`/`cost` fields.
    /// Undirected models contribute an independent arc pair per direction.
    pub fn from_model(model: &NetworkModel) -> Self {
        let mut g = Self::new(model.nodes.len());
        for e in &model.edges {
            // Endpoints are validated at parse time.
            let (Some(u), Some(v)) = (
                model.nodes.iter().position(|n| *n == e.u),
                model.nodes.iter().position(|n| *n == e.v),
            ) else {
                continue;
            };
            g.add_arc(u, v, e.capacity, e.cost);
            if !model.directed {
                g.add_arc(v, u, e.capacity, e.cost);
            }
        }
        g
    }

    pub fn add_arc(&mut self, u: usize, v: usize, cap: f64, cost: f64) {
        self.adj[u].push(self.to.len());
        self.to.push(v);
        self.cap.push(cap);
        self.cost.push(cost);
        self.flow.push(0.0);

        self.adj[v].push(self.to.len());
        self.to.push(u);
        self.cap.push(0.0);
        self.cost.push(-cost);
        self.flow.push(0.0);
    }

    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    pub fn residual(&self, arc: usize) -> f64 {
        self.cap[arc] - self.flow[arc]
    }

    /// Pushes flow on `arc` and pulls it back on the paired reverse arc.
    pub fn push(&mut self, arc: usize, amount: f64) {
        self.flow[arc] += amount;
        self.flow[arc ^ 1] -= amount;
    }

    pub fn tail(&self, arc: usize) -> usize {
        self.to[arc ^ 1]
    }

    /// Positive flows on original (forward) arcs, aggregated per node pair.
    pub fn positive_flows(&self, names: &[String]) -> Vec<FlowEntry> {
        let mut out: Vec<FlowEntry> = Vec::new();
        for arc in (0..self.to.len()).step_by(2) {
            let f = self.flow[arc];
            if f > FLOW_EPS {
                let u = &names[self.tail(arc)];
                let v = &names[self.to[arc]];
                if let Some(entry) = out.iter_mut().find(|e| &e.u == u && &e.v == v) {
                    entry.flow += f;
                } else {
                    out.push(FlowEntry {
                        u: u.clone(),
                        v: v.clone(),
                        flow: f,
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arcs_pair_with_their_reverse() {
        let mut g = Residual::new(2);
        g.add_arc(0, 1, 5.0, 3.0);
        assert_eq!(g.to[0], 1);
        assert_eq!(g.to[1], 0);
        assert_eq!(g.cap[1], 0.0);
        assert_eq!(g.cost[1], -3.0);
        assert_eq!(g.tail(0), 0);
        assert_eq!(g.tail(1), 1);
    }

    #[test]
    fn pushing_flow_is_antisymmetric() {
        let mut g = Residual::new(2);
        g.add_arc(0, 1, 5.0, 0.0);
        g.push(0, 2.0);
        assert_eq!(g.flow[0], 2.0);
        assert_eq!(g.flow[1], -2.0);
        assert_eq!(g.residual(0), 3.0);
        // The reverse arc gained residual capacity.
        assert_eq!(g.residual(1), 2.0);
    }

    #[test]
    fn positive_flows_merge_parallel_arcs() {
        let mut g = Residual::new(2);
        g.add_arc(0, 1, 5.0, 0.0);
        g.add_arc(0, 1, 5.0, 0.0);
        g.push(0, 2.0);
        g.push(2, 1.0);
        let names = vec!["s".to_string(), "t".to_string()];
        let flows = g.positive_flows(&names);
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].flow, 3.0);
    }
}
