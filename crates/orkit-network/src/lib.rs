mod error;
mod graph;
mod max_flow;
mod min_cost_flow;
mod model;
mod mst;
mod shortest_path;
mod solve;

pub use error::NetworkError;
pub use graph::FlowEntry;
pub use max_flow::edmonds_karp;
pub use min_cost_flow::min_cost_flow_ssap;
pub use model::{Edge, NetworkModel};
pub use mst::{DisjointSet, kruskal_mst};
pub use shortest_path::{dijkstra, reconstruct_path};
pub use solve::{
    Highlight, MaxFlowResponse, Method, MinCostFlowResponse, MstEdge, MstResponse,
    NetworkResponse, ShortestPathResponse, solve_network,
};
