use serde::Serialize;
use tracing::debug;

use crate::model::BIG_M;

/// Threshold below which an allocation cell counts as empty.
pub const EPS: f64 = 1e-9;

/// Default cap on stepping-stone improvement steps.
pub const MAX_ITERATIONS: usize = 10_000;

/// A balanced problem: total supply equals total demand, possibly via a
/// zero-cost dummy origin or destination.
#[derive(Debug, Clone)]
pub struct Balanced {
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
    pub costs: Vec<Vec<f64>>,
    pub added_dummy_origin: bool,
    pub added_dummy_destination: bool,
}

fn round8(v: f64) -> f64 {
    (v * 1e8).round() / 1e8
}

/// Copies the inputs and appends a dummy row or column with zero costs when
/// supply and demand disagree (compared after rounding to 1e-8).
pub fn balance_problem(supply: &[f64], demand: &[f64], costs: &[Vec<f64>]) -> Balanced {
    let mut s = supply.to_vec();
    let mut d = demand.to_vec();
    let mut c: Vec<Vec<f64>> = costs.to_vec();

    let s_sum: f64 = s.iter().sum();
    let d_sum: f64 = d.iter().sum();

    if round8(s_sum) > round8(d_sum) {
        d.push(s_sum - d_sum);
        for row in &mut c {
            row.push(0.0);
        }
        return Balanced {
            supply: s,
            demand: d,
            costs: c,
            added_dummy_origin: false,
            added_dummy_destination: true,
        };
    }

    if round8(d_sum) > round8(s_sum) {
        s.push(d_sum - s_sum);
        c.push(vec![0.0; d.len()]);
        return Balanced {
            supply: s,
            demand: d,
            costs: c,
            added_dummy_origin: true,
            added_dummy_destination: false,
        };
    }

    Balanced {
        supply: s,
        demand: d,
        costs: c,
        added_dummy_origin: false,
        added_dummy_destination: false,
    }
}

/// Total shipping cost of an allocation, plus whether any positive cell
/// sits on a Big-M penalty cost.
pub fn total_cost(allocation: &[Vec<f64>], costs: &[Vec<f64>]) -> (f64, bool) {
    let mut z = 0.0;
    let mut has_m = false;
    for (i, row) in allocation.iter().enumerate() {
        for (j, &qty) in row.iter().enumerate() {
            if qty > 0.0 {
                let c = costs[i][j];
                if c >= BIG_M - 1_000.0 {
                    has_m = true;
                }
                z += qty * c;
            }
        }
    }
    (z, has_m)
}

/// Northwest-corner initial allocation: walk the cursor from (0, 0),
/// allocating the smaller of the remaining supply and demand, advancing
/// whichever side was exhausted (both on a simultaneous exhaustion).
pub fn northwest_corner(supply: &[f64], demand: &[f64]) -> Vec<Vec<f64>> {
    let rows = supply.len();
    let cols = demand.len();
    let mut alloc = vec![vec![0.0; cols]; rows];

    let mut s = supply.to_vec();
    let mut d = demand.to_vec();

    let (mut i, mut j) = (0, 0);
    while i < rows && j < cols {
        let qty = s[i].min(d[j]);
        alloc[i][j] = qty;
        s[i] -= qty;
        d[j] -= qty;

        if s[i] <= EPS && d[j] <= EPS {
            i += 1;
            j += 1;
        } else if s[i] <= EPS {
            i += 1;
        } else {
            j += 1;
        }
    }
    alloc
}

/// Least-cost initial allocation: visit cells by ascending cost (row-major
/// among ties) and allocate whatever both sides still have.
pub fn min_cost_method(supply: &[f64], demand: &[f64], costs: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows = supply.len();
    let cols = demand.len();
    let mut alloc = vec![vec![0.0; cols]; rows];

    let mut s = supply.to_vec();
    let mut d = demand.to_vec();

    let mut cells: Vec<(f64, usize, usize)> = (0..rows)
        .flat_map(|i| (0..cols).map(move |j| (0.0, i, j)))
        .collect();
    for cell in &mut cells {
        cell.0 = costs[cell.1][cell.2];
    }
    cells.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    for (_, i, j) in cells {
        if s[i] > EPS && d[j] > EPS {
            let qty = s[i].min(d[j]);
            alloc[i][j] = qty;
            s[i] -= qty;
            d[j] -= qty;
        }
    }
    alloc
}

/// Penalty of an active row or column: the gap between its two cheapest
/// still-active cells. A single remaining cell contributes its own cost;
/// closed lines get -1 so they never win.
fn penalty(values: &mut Vec<f64>) -> f64 {
    match values.len() {
        0 => -1.0,
        1 => values[0],
        _ => {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values[1] - values[0]
        }
    }
}

fn first_max(pen: &[f64]) -> (f64, usize) {
    let mut best = (-1.0, 0);
    for (idx, &v) in pen.iter().enumerate() {
        if v > best.0 {
            best = (v, idx);
        }
    }
    best
}

/// Vogel's approximation: repeatedly allocate the cheapest cell of the row
/// or column with the highest penalty, closing lines as they run out. A
/// residual sweep fills anything the penalty loop left unallocated.
pub fn vogel_approximation(supply: &[f64], demand: &[f64], costs: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows = supply.len();
    let cols = demand.len();
    let mut alloc = vec![vec![0.0; cols]; rows];

    let mut s = supply.to_vec();
    let mut d = demand.to_vec();
    let mut r_done = vec![false; rows];
    let mut c_done = vec![false; cols];

    let mut allocated = 0;
    let target = rows + cols - 1;

    while allocated < target {
        if r_done.iter().all(|&x| x) || c_done.iter().all(|&x| x) {
            break;
        }

        let r_pen: Vec<f64> = (0..rows)
            .map(|i| {
                if r_done[i] {
                    return -1.0;
                }
                let mut vals: Vec<f64> = (0..cols)
                    .filter(|&j| !c_done[j])
                    .map(|j| costs[i][j])
                    .collect();
                penalty(&mut vals)
            })
            .collect();
        let c_pen: Vec<f64> = (0..cols)
            .map(|j| {
                if c_done[j] {
                    return -1.0;
                }
                let mut vals: Vec<f64> = (0..rows)
                    .filter(|&i| !r_done[i])
                    .map(|i| costs[i][j])
                    .collect();
                penalty(&mut vals)
            })
            .collect();

        let (max_r, max_r_idx) = first_max(&r_pen);
        let (max_c, max_c_idx) = first_max(&c_pen);
        if max_r == -1.0 && max_c == -1.0 {
            break;
        }

        let (target_r, target_c) = if max_r >= max_c {
            let i = max_r_idx;
            let mut best: Option<(f64, usize)> = None;
            for j in 0..cols {
                if !c_done[j] {
                    let better = match best {
                        None => true,
                        Some((bc, _)) => costs[i][j] < bc,
                    };
                    if better {
                        best = Some((costs[i][j], j));
                    }
                }
            }
            match best {
                Some((_, j)) => (i, j),
                None => break,
            }
        } else {
            let j = max_c_idx;
            let mut best: Option<(f64, usize)> = None;
            for i in 0..rows {
                if !r_done[i] {
                    let better = match best {
                        None => true,
                        Some((bc, _)) => costs[i][j] < bc,
                    };
                    if better {
                        best = Some((costs[i][j], i));
                    }
                }
            }
            match best {
                Some((_, i)) => (i, j),
                None => break,
            }
        };

        let qty = s[target_r].min(d[target_c]);
        alloc[target_r][target_c] += qty;
        s[target_r] -= qty;
        d[target_c] -= qty;

        if s[target_r] <= EPS {
            r_done[target_r] = true;
        }
        if d[target_c] <= EPS {
            c_done[target_c] = true;
        }
        allocated += 1;
    }

    // Residual sweep for anything the penalty loop left open.
    for i in 0..rows {
        for j in 0..cols {
            if s[i] > EPS && d[j] > EPS {
                let qty = s[i].min(d[j]);
                alloc[i][j] += qty;
                s[i] -= qty;
                d[j] -= qty;
            }
        }
    }

    alloc
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Horizontal,
    Vertical,
}

/// Finds a closed stepping-stone cycle starting and ending at `start`:
/// consecutive cells share a row or column with strictly alternating move
/// directions, every intermediate cell is basic, and the cycle has at least
/// four cells. Depth-first search over the basic-cell grid.
fn find_closed_path(
    alloc: &[Vec<f64>],
    start: (usize, usize),
) -> Option<Vec<(usize, usize)>> {
    let rows = alloc.len();
    let cols = if rows > 0 { alloc[0].len() } else { 0 };

    let mut stack: Vec<((usize, usize), Vec<(usize, usize)>, Option<Move>)> =
        vec![(start, vec![start], None)];

    while let Some((curr, path, prev_dir)) = stack.pop() {
        if curr == start && path.len() >= 4 {
            return Some(path[..path.len() - 1].to_vec());
        }

        let (r, c) = curr;
        let mut neighbors: Vec<((usize, usize), Move)> = Vec::new();

        if prev_dir != Some(Move::Vertical) {
            for i in 0..rows {
                if i != r && (alloc[i][c] > EPS || (i, c) == start) {
                    neighbors.push(((i, c), Move::Vertical));
                }
            }
        }
        if prev_dir != Some(Move::Horizontal) {
            for j in 0..cols {
                if j != c && (alloc[r][j] > EPS || (r, j) == start) {
                    neighbors.push(((r, j), Move::Horizontal));
                }
            }
        }

        for (node, dir) in neighbors {
            if node == start {
                if path.len() >= 3 {
                    let mut next = path.clone();
                    next.push(node);
                    stack.push((node, next, Some(dir)));
                }
            } else if !path.contains(&node) {
                let mut next = path.clone();
                next.push(node);
                stack.push((node, next, Some(dir)));
            }
        }
    }

    None
}

/// One recorded stepping-stone exchange.
#[derive(Debug, Clone, Serialize)]
pub struct TraceStep {
    pub iter: usize,
    pub enter: (usize, usize),
    /// Marginal cost of the entering cell's cycle (negative = improvement).
    pub delta: f64,
    pub theta: f64,
    pub cycle: Vec<(usize, usize)>,
    pub leaving: Option<(usize, usize)>,
    pub total_cost: f64,
    pub allocation: Vec<Vec<f64>>,
}

/// Stepping-stone optimisation.
///
/// Each round scans every empty cell in row-major order, prices its closed
/// cycle (signs alternate along the cycle, `+` at the entering cell) and
/// applies the exchange with the most negative marginal. Cells without a
/// closed cycle are skipped. Returns the improved allocation, the number of
/// exchanges applied (0 when the input is already optimal) and the trace.
pub fn optimize_stepping_stone(
    allocation: &[Vec<f64>],
    costs: &[Vec<f64>],
    max_iterations: usize,
    trace: bool,
    trace_limit: usize,
) -> (Vec<Vec<f64>>, usize, Vec<TraceStep>) {
    let rows = allocation.len();
    let cols = if rows > 0 { allocation[0].len() } else { 0 };

    let mut alloc: Vec<Vec<f64>> = allocation.to_vec();
    let mut it = 0;
    let mut steps: Vec<TraceStep> = Vec::new();

    while it < max_iterations {
        let mut best_marginal = 0.0;
        let mut enter_cell: Option<(usize, usize)> = None;
        let mut best_cycle: Option<Vec<(usize, usize)>> = None;

        for i in 0..rows {
            for j in 0..cols {
                if alloc[i][j] > EPS {
                    continue;
                }
                let Some(cycle) = find_closed_path(&alloc, (i, j)) else {
                    continue;
                };

                let mut marginal = 0.0;
                for (k, &(r, c)) in cycle.iter().enumerate() {
                    if k % 2 == 0 {
                        marginal += costs[r][c];
                    } else {
                        marginal -= costs[r][c];
                    }
                }

                if marginal < best_marginal - EPS {
                    best_marginal = marginal;
                    enter_cell = Some((i, j));
                    best_cycle = Some(cycle);
                }
            }
        }

        let (Some(enter), Some(cycle)) = (enter_cell, best_cycle) else {
            break;
        };
        it += 1;

        let minus: Vec<(usize, usize)> = cycle
            .iter()
            .enumerate()
            .filter(|(k, _)| k % 2 == 1)
            .map(|(_, &cell)| cell)
            .collect();
        if minus.is_empty() {
            break;
        }

        let theta = minus
            .iter()
            .map(|&(r, c)| alloc[r][c])
            .fold(f64::INFINITY, f64::min);

        let leaving = minus
            .iter()
            .copied()
            .find(|&(r, c)| (alloc[r][c] - theta).abs() <= EPS);

        for (k, &(r, c)) in cycle.iter().enumerate() {
            if k % 2 == 0 {
                alloc[r][c] += theta;
            } else {
                alloc[r][c] -= theta;
                if alloc[r][c] < EPS {
                    alloc[r][c] = 0.0;
                }
            }
        }

        debug!(
            iteration = it,
            enter = ?enter,
            delta = best_marginal,
            theta,
            "stepping-stone exchange"
        );

        if trace && steps.len() < trace_limit {
            let (z, _) = total_cost(&alloc, costs);
            steps.push(TraceStep {
                iter: it,
                enter,
                delta: best_marginal,
                theta,
                cycle,
                leaving,
                total_cost: z,
                allocation: alloc.clone(),
            });
        }
    }

    (alloc, it, steps)
}
