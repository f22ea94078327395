use serde::Serialize;

use crate::algorithms::EPS;

/// Tolerance for treating a reduced cost as zero when flagging alternate
/// optimal routes and for the optimality verdict.
const RC_EPS: f64 = 1e-7;

/// The empty cell with the most negative reduced cost, if any.
#[derive(Debug, Clone, Serialize)]
pub struct MostNegative {
    pub i: usize,
    pub j: usize,
    pub reduced_cost: f64,
}

/// MODI sensitivity report for an allocation.
#[derive(Debug, Clone, Serialize)]
pub struct Sensitivity {
    /// Row potentials; `None` for rows not reached by any basic cell.
    pub u: Vec<Option<f64>>,
    /// Column potentials.
    pub v: Vec<Option<f64>>,
    /// `c_ij - u_i - v_j`; `None` where a potential is undefined.
    pub reduced_costs: Vec<Vec<Option<f64>>>,
    pub is_optimal_by_reduced_costs: bool,
    pub most_negative: Option<MostNegative>,
    /// For each empty cell, how far its cost must drop before the route
    /// becomes attractive (zero marks an alternate optimum).
    pub nonbasic_cost_decrease_needed: Vec<Vec<Option<f64>>>,
    pub alternate_optimal_routes: Vec<Vec<bool>>,
}

fn basic_cells(allocation: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let mut basics = Vec::new();
    for (i, row) in allocation.iter().enumerate() {
        for (j, &x) in row.iter().enumerate() {
            if x > EPS {
                basics.push((i, j));
            }
        }
    }
    basics
}

enum Line {
    Row(usize),
    Col(usize),
}

/// MODI potentials: `u_i + v_j = c_ij` on every basic cell, with `u` seeded
/// to zero once per connected component of the basic-cell graph and the
/// rest propagated depth-first.
pub fn compute_potentials(
    costs: &[Vec<f64>],
    allocation: &[Vec<f64>],
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let rows = allocation.len();
    let cols = if rows > 0 { allocation[0].len() } else { 0 };

    let mut u: Vec<Option<f64>> = vec![None; rows];
    let mut v: Vec<Option<f64>> = vec![None; cols];

    let basics = basic_cells(allocation);
    if rows == 0 || cols == 0 || basics.is_empty() {
        return (u, v);
    }

    let mut row_to_cols: Vec<Vec<usize>> = vec![Vec::new(); rows];
    let mut col_to_rows: Vec<Vec<usize>> = vec![Vec::new(); cols];
    for &(i, j) in &basics {
        row_to_cols[i].push(j);
        col_to_rows[j].push(i);
    }

    for seed in 0..rows {
        if row_to_cols[seed].is_empty() || u[seed].is_some() {
            continue;
        }

        u[seed] = Some(0.0);
        let mut stack = vec![Line::Row(seed)];

        while let Some(line) = stack.pop() {
            match line {
                Line::Row(i) => {
                    for &j in &row_to_cols[i] {
                        if v[j].is_none() {
                            if let Some(ui) = u[i] {
                                v[j] = Some(costs[i][j] - ui);
                                stack.push(Line::Col(j));
                            }
                        }
                    }
                }
                Line::Col(j) => {
                    for &i in &col_to_rows[j] {
                        if u[i].is_none() {
                            if let Some(vj) = v[j] {
                                u[i] = Some(costs[i][j] - vj);
                                stack.push(Line::Row(i));
                            }
                        }
                    }
                }
            }
        }
    }

    (u, v)
}

/// Reduced-cost matrix `c_ij - u_i - v_j`.
pub fn reduced_costs(
    costs: &[Vec<f64>],
    u: &[Option<f64>],
    v: &[Option<f64>],
) -> Vec<Vec<Option<f64>>> {
    costs
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, &c)| match (u[i], v[j]) {
                    (Some(ui), Some(vj)) => Some(c - ui - vj),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Full MODI report: potentials, reduced costs, the most negative empty
/// cell, per-cell entry thresholds and alternate-optimum flags.
pub fn transport_sensitivity(costs: &[Vec<f64>], allocation: &[Vec<f64>]) -> Sensitivity {
    let (u, v) = compute_potentials(costs, allocation);
    let rc = reduced_costs(costs, &u, &v);

    let rows = allocation.len();
    let cols = if rows > 0 { allocation[0].len() } else { 0 };

    let mut most_negative: Option<MostNegative> = None;
    for i in 0..rows {
        for j in 0..cols {
            if allocation[i][j] > EPS {
                continue;
            }
            let Some(val) = rc[i][j] else { continue };
            if val < -RC_EPS {
                let is_better = match &most_negative {
                    None => true,
                    Some(best) => val < best.reduced_cost,
                };
                if is_better {
                    most_negative = Some(MostNegative { i, j, reduced_cost: val });
                }
            }
        }
    }

    let is_optimal = most_negative.is_none();

    let mut thresholds: Vec<Vec<Option<f64>>> = vec![vec![None; cols]; rows];
    let mut alt_opt = vec![vec![false; cols]; rows];

    for i in 0..rows {
        for j in 0..cols {
            if allocation[i][j] > EPS {
                continue;
            }
            let Some(val) = rc[i][j] else { continue };
            if val.abs() <= RC_EPS {
                alt_opt[i][j] = true;
                thresholds[i][j] = Some(0.0);
            } else {
                // Positive: how much the cost must drop to enter.
                // Negative: the route already improves the solution.
                thresholds[i][j] = Some(val);
            }
        }
    }

    Sensitivity {
        u,
        v,
        reduced_costs: rc,
        is_optimal_by_reduced_costs: is_optimal,
        most_negative,
        nonbasic_cost_decrease_needed: thresholds,
        alternate_optimal_routes: alt_opt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{MAX_ITERATIONS, optimize_stepping_stone, vogel_approximation};

    #[test]
    fn potentials_satisfy_basic_cells() {
        let costs = vec![vec![4.0, 6.0], vec![3.0, 2.0]];
        let alloc = vec![vec![5.0, 2.0], vec![0.0, 6.0]];
        let (u, v) = compute_potentials(&costs, &alloc);
        for (i, row) in alloc.iter().enumerate() {
            for (j, &x) in row.iter().enumerate() {
                if x > EPS {
                    let lhs = u[i].unwrap() + v[j].unwrap();
                    assert!((lhs - costs[i][j]).abs() <= 1e-7);
                }
            }
        }
        assert_eq!(u[0], Some(0.0));
    }

    #[test]
    fn disconnected_components_each_get_a_seed() {
        // Two independent 1x1 blocks: (0,0) and (1,1) basic.
        let costs = vec![vec![4.0, 9.0], vec![9.0, 2.0]];
        let alloc = vec![vec![5.0, 0.0], vec![0.0, 6.0]];
        let (u, v) = compute_potentials(&costs, &alloc);
        assert_eq!(u[0], Some(0.0));
        assert_eq!(u[1], Some(0.0));
        assert_eq!(v[0], Some(4.0));
        assert_eq!(v[1], Some(2.0));
    }

    #[test]
    fn optimal_allocation_has_no_negative_reduced_cost() {
        let costs = vec![
            vec![8.0, 6.0, 10.0, 9.0],
            vec![9.0, 12.0, 13.0, 7.0],
            vec![14.0, 9.0, 16.0, 5.0],
        ];
        let supply = [20.0, 30.0, 25.0];
        let demand = [10.0, 10.0, 15.0, 40.0];
        let start = vogel_approximation(&supply, &demand, &costs);
        let (opt, _, _) = optimize_stepping_stone(&start, &costs, MAX_ITERATIONS, false, 0);

        let report = transport_sensitivity(&costs, &opt);
        assert!(report.is_optimal_by_reduced_costs);
        assert!(report.most_negative.is_none());
        for i in 0..costs.len() {
            for j in 0..costs[0].len() {
                if opt[i][j] > EPS {
                    if let (Some(ui), Some(vj)) = (report.u[i], report.v[j]) {
                        assert!((costs[i][j] - ui - vj).abs() <= 1e-7);
                    }
                }
            }
        }
    }

    #[test]
    fn thresholds_report_required_decrease() {
        let costs = vec![vec![4.0, 6.0], vec![3.0, 2.0]];
        let alloc = vec![vec![5.0, 2.0], vec![0.0, 6.0]];
        let report = transport_sensitivity(&costs, &alloc);
        let rc = report.reduced_costs[1][0].unwrap();
        let threshold = report.nonbasic_cost_decrease_needed[1][0].unwrap();
        assert!((rc - threshold).abs() < 1e-9);
        // Basic cells carry no threshold entry.
        assert!(report.nonbasic_cost_decrease_needed[0][0].is_none());
    }
}
