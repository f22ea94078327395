use crate::error::NetworkError;
use crate::model::{Edge, NetworkModel};

/// Union-Find over node indices with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the two sets; returns false when already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.rank[ra] < self.rank[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        if self.rank[ra] == self.rank[rb] {
            self.rank[ra] += 1;
        }
        true
    }
}

/// Kruskal's minimum spanning tree over the undirected view of the edges.
///
/// Edges are taken by ascending `weight` with input order among equals
/// (stable sort), so results are deterministic. A disconnected graph yields
/// a spanning forest with fewer than `n - 1` edges.
pub fn kruskal_mst(model: &NetworkModel) -> Result<(f64, Vec<Edge>), NetworkError> {
    let n = model.nodes.len();
    let mut dsu = DisjointSet::new(n);

    let mut order: Vec<&Edge> = model.edges.iter().collect();
    order.sort_by(|a, b| {
        a.weight
            .partial_cmp(&b.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut mst = Vec::new();
    let mut total = 0.0;
    for e in order {
        let u = model.node_index(&e.u)?;
        let v = model.node_index(&e.v)?;
        if dsu.union(u, v) {
            total += e.weight;
            mst.push(e.clone());
            if mst.len() == n.saturating_sub(1) {
                break;
            }
        }
    }

    Ok((total, mst))
}
