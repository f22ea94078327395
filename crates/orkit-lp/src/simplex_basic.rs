use crate::error::LpError;
use crate::model::{LpModel, LpSolution, Sense, SolveInfo, Status};
use crate::simplex::{Tableau, extract_basic_solution, simplex_max, MAX_ITERATIONS};

/// Canonical tableau for a model whose constraints are all `<=` with
/// non-negative right-hand sides.
#[derive(Debug, Clone)]
pub struct BasicBuild {
    pub tableau: Tableau,
    pub n_original: usize,
    pub var_names: Vec<String>,
}

/// Lays out `n` original columns, one slack per constraint (the initial
/// basis), and the RHS. Row 0 is `-c` in maximisation form.
pub fn build_basic_tableau(model: &LpModel) -> BasicBuild {
    let n = model.num_variables();
    let m = model.num_constraints();

    let total_cols = n + m;
    let rhs = total_cols;
    let width = total_cols + 1;

    let mut rows = vec![vec![0.0; width]; m + 1];
    let mut basis = vec![None; m];

    let mut c_vec = model.c.clone();
    if model.sense == Sense::Min {
        for v in &mut c_vec {
            *v = -*v;
        }
    }
    for (j, &cj) in c_vec.iter().enumerate() {
        rows[0][j] = -cj;
    }

    for (i, cst) in model.constraints.iter().enumerate() {
        let row = i + 1;
        for (j, &aj) in cst.a.iter().enumerate() {
            rows[row][j] = aj;
        }
        let slack_col = n + i;
        rows[row][slack_col] = 1.0;
        basis[i] = Some(slack_col);
        rows[row][rhs] = cst.b;
    }

    let var_names = (0..n)
        .map(|j| format!("x{}", j + 1))
        .chain((0..m).map(|i| format!("s{}", i + 1)))
        .collect();

    BasicBuild {
        tableau: Tableau::new(rows, basis),
        n_original: n,
        var_names,
    }
}

/// Solves an all-`<=` model with the plain simplex method.
pub fn solve_simplex_basic(model: &LpModel) -> Result<LpSolution, LpError> {
    let build = build_basic_tableau(model);
    let mut t = build.tableau;

    let it = match simplex_max(&mut t, MAX_ITERATIONS, None) {
        Ok(it) => it,
        Err(LpError::Unbounded) => {
            return Ok(LpSolution::unbounded(build.n_original, 0, "simplex"));
        }
        Err(e) => return Err(e),
    };

    let x = extract_basic_solution(&t, build.n_original);
    let mut z = t.rows[0][t.rhs_col()];
    if model.sense == Sense::Min {
        z = -z;
    }
    let extra = SolveInfo::from_tableau(&t, build.var_names);
    Ok(LpSolution {
        status: Status::Optimal,
        x,
        objective_value: z,
        iterations: it,
        message: "OK".to_string(),
        method_used: "simplex".to_string(),
        extra: Some(extra),
    })
}
