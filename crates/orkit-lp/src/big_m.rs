use crate::error::LpError;
use crate::model::{
    Constraint, LpModel, LpSolution, Relation, Sense, SolveInfo, Status, TableauHistory,
};
use crate::simplex::{Tableau, extract_basic_solution, simplex_max, MAX_ITERATIONS};

/// Penalty attached to artificial variables.
pub const DEFAULT_M: f64 = 1e6;

/// Feasibility threshold on artificial RHS values at termination.
const FEAS_EPS: f64 = 1e-7;

/// Big-M tableau plus bookkeeping for the feasibility check.
#[derive(Debug, Clone)]
pub struct BigMBuild {
    pub tableau: Tableau,
    pub n_original: usize,
    pub artificial_cols: Vec<usize>,
    pub var_names: Vec<String>,
}

/// Same column layout as the two-phase builder, but row 0 carries the real
/// objective with artificials penalised by `+M`, made canonical by
/// subtracting `M` times each artificial-basic row.
pub fn build_big_m_tableau(model: &LpModel, m_penalty: f64) -> BigMBuild {
    let constraints: Vec<Constraint> =
        model.constraints.iter().map(|c| c.normalized()).collect();
    let n = model.num_variables();
    let m = constraints.len();

    let slack = constraints.iter().filter(|c| c.op == Relation::Le).count();
    let surplus = constraints.iter().filter(|c| c.op == Relation::Ge).count();
    let artificial = constraints.iter().filter(|c| c.op != Relation::Le).count();

    let total_cols = n + slack + surplus + artificial;
    let rhs = total_cols;
    let width = total_cols + 1;

    let slack_start = n;
    let surplus_start = n + slack;
    let artificial_start = n + slack + surplus;

    let mut rows = vec![vec![0.0; width]; m + 1];
    let mut basis: Vec<Option<usize>> = vec![None; m];
    let mut artificial_cols = Vec::new();

    let mut c_vec = model.c.clone();
    if model.sense == Sense::Min {
        for v in &mut c_vec {
            *v = -*v;
        }
    }
    for (j, &cj) in c_vec.iter().enumerate() {
        rows[0][j] = -cj;
    }

    let (mut s_i, mut e_i, mut a_i) = (0, 0, 0);
    for (i, cst) in constraints.iter().enumerate() {
        let row = i + 1;
        for (j, &aj) in cst.a.iter().enumerate() {
            rows[row][j] = aj;
        }
        rows[row][rhs] = cst.b;

        match cst.op {
            Relation::Le => {
                let col_s = slack_start + s_i;
                rows[row][col_s] = 1.0;
                basis[i] = Some(col_s);
                s_i += 1;
            }
            Relation::Ge => {
                let col_e = surplus_start + e_i;
                rows[row][col_e] = -1.0;
                e_i += 1;
                let col_a = artificial_start + a_i;
                rows[row][col_a] = 1.0;
                basis[i] = Some(col_a);
                artificial_cols.push(col_a);
                a_i += 1;
            }
            Relation::Eq => {
                let col_a = artificial_start + a_i;
                rows[row][col_a] = 1.0;
                basis[i] = Some(col_a);
                artificial_cols.push(col_a);
                a_i += 1;
            }
        }
    }

    let var_names = (0..n)
        .map(|j| format!("x{}", j + 1))
        .chain((0..slack).map(|k| format!("s{}", k + 1)))
        .chain((0..surplus).map(|k| format!("e{}", k + 1)))
        .chain((0..artificial).map(|k| format!("a{}", k + 1)))
        .collect();

    // Artificials cost -M under maximisation, so row 0 holds +M there.
    for &col_a in &artificial_cols {
        rows[0][col_a] = m_penalty;
    }

    // Canonical form for the artificial basis.
    for i in 0..m {
        if let Some(bcol) = basis[i] {
            if artificial_cols.contains(&bcol) {
                let constraint_row = rows[i + 1].clone();
                for (j, v) in rows[0].iter_mut().enumerate() {
                    *v -= m_penalty * constraint_row[j];
                }
            }
        }
    }

    BigMBuild {
        tableau: Tableau::new(rows, basis),
        n_original: n,
        artificial_cols,
        var_names,
    }
}

/// Single-phase Big-M solve with the default penalty. The iteration history
/// is always recorded into the solution's extra bundle.
pub fn solve_big_m(model: &LpModel) -> Result<LpSolution, LpError> {
    let build = build_big_m_tableau(model, DEFAULT_M);
    let mut t = build.tableau;

    let mut history = Vec::new();
    let it = match simplex_max(&mut t, MAX_ITERATIONS, Some(&mut history)) {
        Ok(it) => it,
        Err(LpError::Unbounded) => {
            return Ok(LpSolution::unbounded(build.n_original, 0, "big_m"));
        }
        Err(e) => return Err(e),
    };

    let with_history = |mut info: SolveInfo| {
        info.tableau_history = Some(TableauHistory {
            label: "Big M".to_string(),
            var_names: build.var_names.clone(),
            items: history.clone(),
        });
        info
    };

    // Any artificial still basic and positive proves infeasibility.
    let rhs = t.rhs_col();
    for (i, b) in t.basis.iter().enumerate() {
        if let Some(col) = b {
            if build.artificial_cols.contains(col) && t.rows[i + 1][rhs] > FEAS_EPS {
                let extra = with_history(SolveInfo::from_tableau(&t, build.var_names.clone()));
                let mut res = LpSolution::infeasible(
                    build.n_original,
                    it,
                    "INFEASIBLE: artificial variable remains basic and positive",
                    "big_m",
                );
                res.extra = Some(extra);
                return Ok(res);
            }
        }
    }

    let x = extract_basic_solution(&t, build.n_original);
    let mut z = t.rows[0][rhs];
    if model.sense == Sense::Min {
        z = -z;
    }

    let extra = with_history(SolveInfo::from_tableau(&t, build.var_names.clone()));
    Ok(LpSolution {
        status: Status::Optimal,
        x,
        objective_value: z,
        iterations: it,
        message: "OK".to_string(),
        method_used: "big_m".to_string(),
        extra: Some(extra),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalised_row0_is_canonical() {
        let model = LpModel {
            name: "ge".to_string(),
            sense: Sense::Max,
            c: vec![2.0, 1.0],
            constraints: vec![
                Constraint { a: vec![1.0, 1.0], op: Relation::Ge, b: 4.0 },
                Constraint { a: vec![1.0, 0.0], op: Relation::Le, b: 6.0 },
            ],
        };
        let build = build_big_m_tableau(&model, DEFAULT_M);
        // Columns: x1 x2 | s1 | e1 | a1 | RHS
        assert_eq!(build.tableau.width(), 6);
        assert_eq!(build.artificial_cols, vec![4]);
        // Row 0 at the artificial basic column must already be zero.
        assert!(build.tableau.rows[0][4].abs() < 1e-9);
        // And the RHS of row 0 picked up -M * b.
        assert!((build.tableau.rows[0][5] + DEFAULT_M * 4.0).abs() < 1e-6);
    }

    #[test]
    fn solves_minimisation_with_mixed_constraints() {
        // min 4x + y s.t. 3x + y = 3, 4x + 3y >= 6, x + 2y <= 4
        // Optimal at x = 2/5, y = 9/5 with z = 17/5.
        let model = LpModel {
            name: "mixed".to_string(),
            sense: Sense::Min,
            c: vec![4.0, 1.0],
            constraints: vec![
                Constraint { a: vec![3.0, 1.0], op: Relation::Eq, b: 3.0 },
                Constraint { a: vec![4.0, 3.0], op: Relation::Ge, b: 6.0 },
                Constraint { a: vec![1.0, 2.0], op: Relation::Le, b: 4.0 },
            ],
        };
        let res = solve_big_m(&model).unwrap();
        assert_eq!(res.status, Status::Optimal);
        assert_eq!(res.method_used, "big_m");
        assert!((res.x[0] - 0.4).abs() < 1e-6);
        assert!((res.x[1] - 1.8).abs() < 1e-6);
        assert!((res.objective_value - 3.4).abs() < 1e-6);
    }

    #[test]
    fn records_history_in_extra() {
        let model = LpModel {
            name: "hist".to_string(),
            sense: Sense::Max,
            c: vec![1.0],
            constraints: vec![Constraint { a: vec![1.0], op: Relation::Eq, b: 2.0 }],
        };
        let res = solve_big_m(&model).unwrap();
        let history = res.extra.unwrap().tableau_history.unwrap();
        assert_eq!(history.label, "Big M");
        assert!(!history.items.is_empty());
        assert_eq!(history.items[0].iteration, 0);
    }

    #[test]
    fn infeasible_when_artificial_stays_basic() {
        let model = LpModel {
            name: "infeasible".to_string(),
            sense: Sense::Max,
            c: vec![1.0],
            constraints: vec![
                Constraint { a: vec![1.0], op: Relation::Ge, b: 5.0 },
                Constraint { a: vec![1.0], op: Relation::Le, b: 3.0 },
            ],
        };
        let res = solve_big_m(&model).unwrap();
        assert_eq!(res.status, Status::Infeasible);
        assert!(res.objective_value.is_nan());
        // The history is preserved up to the failure point.
        assert!(res.extra.is_some());
    }
}
