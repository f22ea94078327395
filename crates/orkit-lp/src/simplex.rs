use serde::Serialize;
use tracing::debug;

use crate::error::LpError;

/// Tolerance for pivot selection and reduced-cost optimality tests.
pub const EPS: f64 = 1e-9;

/// Hard ceiling on simplex iterations per run.
pub const MAX_ITERATIONS: usize = 10_000;

/// Dense simplex tableau in maximisation form.
///
/// Row 0 is the reduced-cost row, rows `1..=m` are constraint rows, and the
/// last column holds the right-hand side. `basis` records one column index
/// per constraint row; an entry is `None` only transiently, after artificial
/// columns have been deleted and before the pivot-out pass repairs the slot.
#[derive(Debug, Clone)]
pub struct Tableau {
    pub rows: Vec<Vec<f64>>,
    pub basis: Vec<Option<usize>>,
}

impl Tableau {
    pub fn new(rows: Vec<Vec<f64>>, basis: Vec<Option<usize>>) -> Self {
        Self { rows, basis }
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn rhs_col(&self) -> usize {
        self.width() - 1
    }

    /// Gauss-Jordan pivot: normalise `row` by the pivot element, then
    /// eliminate `col` from every other row.
    pub fn pivot(&mut self, row: usize, col: usize) -> Result<(), LpError> {
        let p = self.rows[row][col];
        if p.abs() < EPS {
            return Err(LpError::DegeneratePivot { row, col });
        }
        for v in &mut self.rows[row] {
            *v /= p;
        }
        let pivot_row = self.rows[row].clone();
        for (r, other) in self.rows.iter_mut().enumerate() {
            if r == row {
                continue;
            }
            let factor = other[col];
            if factor.abs() > EPS {
                for (j, v) in other.iter_mut().enumerate() {
                    *v -= factor * pivot_row[j];
                }
            }
        }
        Ok(())
    }

    /// Entering column: the most negative entry of row 0 (RHS excluded),
    /// lowest index among ties. `None` means every reduced cost is above
    /// `-EPS` and the tableau is optimal.
    pub fn choose_entering(&self) -> Option<usize> {
        let row0 = &self.rows[0];
        let mut best: Option<(f64, usize)> = None;
        for (j, &v) in row0[..row0.len() - 1].iter().enumerate() {
            match best {
                Some((bv, _)) if v >= bv => {}
                _ => best = Some((v, j)),
            }
        }
        match best {
            Some((v, j)) if v < -EPS => Some(j),
            _ => None,
        }
    }

    /// Leaving row by the minimum-ratio test over rows with a positive
    /// coefficient in `col`; lowest row index among equal ratios. `None`
    /// means the column is unbounded.
    pub fn choose_leaving(&self, col: usize) -> Option<usize> {
        let rhs = self.rhs_col();
        let mut best: Option<(f64, usize)> = None;
        for i in 1..self.rows.len() {
            let a = self.rows[i][col];
            if a > EPS {
                let ratio = self.rows[i][rhs] / a;
                let better = match best {
                    None => true,
                    Some((br, _)) => ratio < br,
                };
                if better {
                    best = Some((ratio, i));
                }
            }
        }
        best.map(|(_, i)| i)
    }
}

/// Pivot element location in one-based row/column notation.
#[derive(Debug, Clone, Serialize)]
pub struct PivotStep {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// One recorded simplex iteration: the tableau after the pivot plus the
/// choices that produced it. Iteration 0 is the starting tableau.
#[derive(Debug, Clone, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub tableau: Vec<Vec<f64>>,
    pub basis: Vec<Option<usize>>,
    pub enter: Option<usize>,
    pub leave: Option<usize>,
    pub leave_var: Option<usize>,
    pub pivot: Option<PivotStep>,
    pub row_ops: Vec<String>,
}

/// Runs the simplex loop on a maximisation tableau until optimality.
///
/// Returns the number of pivots performed. Unboundedness surfaces as
/// [`LpError::Unbounded`], which drivers convert into a solution status;
/// hitting `max_iter` is a hard numeric failure.
///
/// When `history` is given, every iteration is appended together with the
/// human-readable row operations in one-based notation (`F2 = F2 / (3)`).
pub fn simplex_max(
    t: &mut Tableau,
    max_iter: usize,
    mut history: Option<&mut Vec<IterationRecord>>,
) -> Result<usize, LpError> {
    if let Some(h) = history.as_deref_mut() {
        h.push(IterationRecord {
            iteration: 0,
            tableau: t.rows.clone(),
            basis: t.basis.clone(),
            enter: None,
            leave: None,
            leave_var: None,
            pivot: None,
            row_ops: Vec::new(),
        });
    }

    let mut it = 0;
    while it < max_iter {
        it += 1;

        let Some(enter) = t.choose_entering() else {
            return Ok(it - 1);
        };
        let Some(leave) = t.choose_leaving(enter) else {
            return Err(LpError::Unbounded);
        };

        let pivot_value = t.rows[leave][enter];
        let leave_var = t.basis[leave - 1];
        debug!(iteration = it, enter, leave, pivot = pivot_value, "simplex pivot");

        let mut row_ops = Vec::new();
        if history.is_some() {
            row_ops.push(format!("F{} = F{} / ({})", leave + 1, leave + 1, pivot_value));
            for (r, row) in t.rows.iter().enumerate() {
                if r == leave {
                    continue;
                }
                let factor = row[enter];
                if factor.abs() >= EPS {
                    row_ops.push(format!("F{} = F{} - ({}) * F{}", r + 1, r + 1, factor, leave + 1));
                }
            }
        }

        t.pivot(leave, enter)?;
        t.basis[leave - 1] = Some(enter);

        if let Some(h) = history.as_deref_mut() {
            h.push(IterationRecord {
                iteration: it,
                tableau: t.rows.clone(),
                basis: t.basis.clone(),
                enter: Some(enter),
                leave: Some(leave),
                leave_var,
                pivot: Some(PivotStep {
                    row: leave + 1,
                    col: enter + 1,
                    value: pivot_value,
                }),
                row_ops,
            });
        }
    }

    Err(LpError::IterationLimit(max_iter))
}

/// Reads the original-variable values out of the basic columns.
pub fn extract_basic_solution(t: &Tableau, n_original: usize) -> Vec<f64> {
    let rhs = t.rhs_col();
    let mut x = vec![0.0; n_original];
    for (i, b) in t.basis.iter().enumerate() {
        if let Some(col) = *b {
            if col < n_original {
                x[col] = t.rows[i + 1][rhs];
            }
        }
    }
    x
}
