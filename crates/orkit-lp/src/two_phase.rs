use std::collections::HashSet;

use crate::error::LpError;
use crate::model::{Constraint, LpModel, LpSolution, Relation, Sense, SolveInfo, Status};
use crate::simplex::{Tableau, extract_basic_solution, simplex_max, EPS, MAX_ITERATIONS};

/// Feasibility threshold on Phase-I residuals and artificial RHS values.
const FEAS_EPS: f64 = 1e-7;

/// Phase-I tableau plus the bookkeeping needed for Phase II.
#[derive(Debug, Clone)]
pub struct TwoPhaseBuild {
    pub tableau: Tableau,
    pub n_original: usize,
    pub artificial_cols: Vec<usize>,
    pub var_names: Vec<String>,
}

/// Builds the Phase-I tableau: columns laid out as originals, slacks,
/// surpluses, artificials, RHS. Constraints with negative RHS are flipped
/// first. Row 0 maximises `-sum(artificials)` and is made canonical with
/// respect to the artificial basis.
pub fn build_phase1_tableau(model: &LpModel) -> TwoPhaseBuild {
    let constraints: Vec<Constraint> =
        model.constraints.iter().map(|c| c.normalized()).collect();
    let n = model.num_variables();
    let m = constraints.len();

    let slack = constraints.iter().filter(|c| c.op == Relation::Le).count();
    let surplus = constraints.iter().filter(|c| c.op == Relation::Ge).count();
    let artificial = constraints
        .iter()
        .filter(|c| c.op != Relation::Le)
        .count();

    let total_cols = n + slack + surplus + artificial;
    let rhs = total_cols;
    let width = total_cols + 1;

    let slack_start = n;
    let surplus_start = n + slack;
    let artificial_start = n + slack + surplus;

    let mut rows = vec![vec![0.0; width]; m + 1];
    let mut basis: Vec<Option<usize>> = vec![None; m];
    let mut artificial_cols = Vec::new();

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

    // Phase I maximises -sum(artificials), so row 0 carries +1 there.
    for &col_a in &artificial_cols {
        rows[0][col_a] = 1.0;
    }

    // Canonical form: clear row 0 at every artificial basic column.
    for i in 0..m {
        if let Some(bcol) = basis[i] {
            if artificial_cols.contains(&bcol) {
                let factor = rows[0][bcol];
                if factor.abs() > EPS {
                    let constraint_row = rows[i + 1].clone();
                    for (j, v) in rows[0].iter_mut().enumerate() {
                        *v -= factor * constraint_row[j];
                    }
                }
            }
        }
    }

    TwoPhaseBuild {
        tableau: Tableau::new(rows, basis),
        n_original: n,
        artificial_cols,
        var_names,
    }
}

/// Deletes the given columns, shifting the basis indices left; basis slots
/// pointing at removed columns become `None`.
fn remove_columns(t: &Tableau, remove: &[usize], var_names: &[String]) -> (Tableau, Vec<String>) {
    let remove_set: HashSet<usize> = remove.iter().copied().collect();
    let keep: Vec<usize> = (0..t.width()).filter(|j| !remove_set.contains(j)).collect();

    let rows = t
        .rows
        .iter()
        .map(|row| keep.iter().map(|&j| row[j]).collect())
        .collect();

    let basis = t
        .basis
        .iter()
        .map(|b| match b {
            Some(col) if remove_set.contains(col) => None,
            Some(col) => Some(col - remove.iter().filter(|&&c| c < *col).count()),
            None => None,
        })
        .collect();

    let names = var_names
        .iter()
        .enumerate()
        .filter(|(j, _)| !remove_set.contains(j))
        .map(|(_, v)| v.clone())
        .collect();

    (Tableau::new(rows, basis), names)
}

/// Re-bases rows whose artificial variable was deleted while basic.
///
/// Such a row has RHS ~ 0; any column with a non-zero coefficient can take
/// over the basis slot. Rows where no candidate exists stay degenerate,
/// which is harmless.
fn pivot_out_artificial_zeros(t: &mut Tableau) -> Result<(), LpError> {
    let rhs = t.rhs_col();
    for i in 0..t.basis.len() {
        if t.basis[i].is_some() {
            continue;
        }
        let row = i + 1;
        if t.rows[row][rhs].abs() > FEAS_EPS {
            continue;
        }
        let candidate = (0..rhs).find(|&j| t.rows[row][j].abs() > EPS);
        if let Some(j) = candidate {
            t.pivot(row, j)?;
            t.basis[i] = Some(j);
        }
    }
    Ok(())
}

/// Rewrites row 0 as the original objective (in maximisation form) and
/// restores canonical form with respect to the current basis.
fn rebuild_phase2_objective(t: &mut Tableau, c: &[f64], sense: Sense) {
    let width = t.width();
    let mut c_vec = c.to_vec();
    if sense == Sense::Min {
        for v in &mut c_vec {
            *v = -*v;
        }
    }

    t.rows[0] = vec![0.0; width];
    for (j, &cj) in c_vec.iter().enumerate() {
        t.rows[0][j] = -cj;
    }

    for i in 0..t.basis.len() {
        let Some(bcol) = t.basis[i] else { continue };
        if bcol < c_vec.len() {
            let cost = -t.rows[0][bcol];
            if cost.abs() > EPS {
                let constraint_row = t.rows[i + 1].clone();
                for (j, v) in t.rows[0].iter_mut().enumerate() {
                    *v += cost * constraint_row[j];
                }
            }
        }
    }
}

/// Two-phase simplex: Phase I drives the artificials to zero (or proves
/// infeasibility), Phase II re-optimises the original objective.
pub fn solve_two_phase(model: &LpModel) -> Result<LpSolution, LpError> {
    let build = build_phase1_tableau(model);
    let mut t = build.tableau;

    let it1 = match simplex_max(&mut t, MAX_ITERATIONS, None) {
        Ok(it) => it,
        Err(LpError::Unbounded) => {
            return Ok(LpSolution::unbounded(build.n_original, 0, "two_phase"));
        }
        Err(e) => return Err(e),
    };

    let rhs = t.rhs_col();
    let phase1_obj = t.rows[0][rhs];
    if phase1_obj.abs() > FEAS_EPS {
        return Ok(LpSolution::infeasible(
            build.n_original,
            it1,
            "INFEASIBLE: phase I objective did not reach zero",
            "two_phase",
        ));
    }

    for (i, b) in t.basis.iter().enumerate() {
        if let Some(col) = b {
            if build.artificial_cols.contains(col) && t.rows[i + 1][rhs] > FEAS_EPS {
                return Ok(LpSolution::infeasible(
                    build.n_original,
                    it1,
                    "INFEASIBLE: artificial variable remains basic and positive",
                    "two_phase",
                ));
            }
        }
    }

    let mut remove = build.artificial_cols.clone();
    remove.sort_unstable();
    let (mut t2, var_names2) = remove_columns(&t, &remove, &build.var_names);

    pivot_out_artificial_zeros(&mut t2)?;
    rebuild_phase2_objective(&mut t2, &model.c, model.sense);

    let it2 = match simplex_max(&mut t2, MAX_ITERATIONS, None) {
        Ok(it) => it,
        Err(LpError::Unbounded) => {
            return Ok(LpSolution::unbounded(build.n_original, it1, "two_phase"));
        }
        Err(e) => return Err(e),
    };

    let x = extract_basic_solution(&t2, build.n_original);
    let mut z = t2.rows[0][t2.rhs_col()];
    if model.sense == Sense::Min {
        z = -z;
    }

    let extra = SolveInfo::from_tableau(&t2, var_names2);
    Ok(LpSolution {
        status: Status::Optimal,
        x,
        objective_value: z,
        iterations: it1 + it2,
        message: "OK".to_string(),
        method_used: "two_phase".to_string(),
        extra: Some(extra),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase1_layout_tracks_artificials() {
        let model = LpModel {
            name: "mixed".to_string(),
            sense: Sense::Max,
            c: vec![1.0, 1.0],
            constraints: vec![
                Constraint { a: vec![1.0, 1.0], op: Relation::Ge, b: 2.0 },
                Constraint { a: vec![1.0, 0.0], op: Relation::Eq, b: 1.0 },
                Constraint { a: vec![0.0, 1.0], op: Relation::Le, b: 5.0 },
            ],
        };
        let build = build_phase1_tableau(&model);
        // 2 originals + 1 slack + 1 surplus + 2 artificials + RHS
        assert_eq!(build.tableau.width(), 7);
        assert_eq!(build.artificial_cols, vec![4, 5]);
        assert_eq!(build.tableau.basis, vec![Some(4), Some(5), Some(2)]);
        assert_eq!(
            build.var_names,
            vec!["x1", "x2", "s1", "e1", "a1", "a2"]
        );
        // Canonical: row 0 must be zero at the artificial basic columns.
        assert!(build.tableau.rows[0][4].abs() < 1e-12);
        assert!(build.tableau.rows[0][5].abs() < 1e-12);
    }

    #[test]
    fn negative_rhs_is_flipped_before_layout() {
        let model = LpModel {
            name: "flip".to_string(),
            sense: Sense::Max,
            c: vec![1.0],
            constraints: vec![Constraint { a: vec![-1.0], op: Relation::Le, b: -2.0 }],
        };
        let build = build_phase1_tableau(&model);
        // Flipped to x >= 2: surplus plus artificial, no slack.
        assert_eq!(build.artificial_cols.len(), 1);
        assert_eq!(build.tableau.rows[1][0], 1.0);
        assert_eq!(build.tableau.rows[1][build.tableau.rhs_col()], 2.0);
    }

    #[test]
    fn solves_minimisation_with_ge() {
        // min 2x + 3y s.t. x + y >= 4, x <= 3, y <= 3 -> x=3, y=1, z=9
        let model = LpModel {
            name: "min_ge".to_string(),
            sense: Sense::Min,
            c: vec![2.0, 3.0],
            constraints: vec![
                Constraint { a: vec![1.0, 1.0], op: Relation::Ge, b: 4.0 },
                Constraint { a: vec![1.0, 0.0], op: Relation::Le, b: 3.0 },
                Constraint { a: vec![0.0, 1.0], op: Relation::Le, b: 3.0 },
            ],
        };
        let res = solve_two_phase(&model).unwrap();
        assert_eq!(res.status, Status::Optimal);
        assert!((res.x[0] - 3.0).abs() < 1e-6);
        assert!((res.x[1] - 1.0).abs() < 1e-6);
        assert!((res.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn solves_equality_constraints() {
        // max 2x + 3y s.t. x + y = 5, x + 2y <= 8 -> x=2, y=3, z=13
        let model = LpModel {
            name: "eq".to_string(),
            sense: Sense::Max,
            c: vec![2.0, 3.0],
            constraints: vec![
                Constraint { a: vec![1.0, 1.0], op: Relation::Eq, b: 5.0 },
                Constraint { a: vec![1.0, 2.0], op: Relation::Le, b: 8.0 },
            ],
        };
        let res = solve_two_phase(&model).unwrap();
        assert_eq!(res.status, Status::Optimal);
        assert!((res.x[0] - 2.0).abs() < 1e-6);
        assert!((res.x[1] - 3.0).abs() < 1e-6);
        assert!((res.objective_value - 13.0).abs() < 1e-6);
    }

    #[test]
    fn detects_infeasible_bounds() {
        // x >= 5 and x <= 3 cannot both hold.
        let model = LpModel {
            name: "infeasible".to_string(),
            sense: Sense::Min,
            c: vec![1.0],
            constraints: vec![
                Constraint { a: vec![1.0], op: Relation::Ge, b: 5.0 },
                Constraint { a: vec![1.0], op: Relation::Le, b: 3.0 },
            ],
        };
        let res = solve_two_phase(&model).unwrap();
        assert_eq!(res.status, Status::Infeasible);
        assert!(res.objective_value.is_nan());
        assert_eq!(res.x, vec![0.0]);
    }

    #[test]
    fn unbounded_after_feasible_phase1() {
        // max x + y with only x + y >= 1 keeps growing.
        let model = LpModel {
            name: "unbounded".to_string(),
            sense: Sense::Max,
            c: vec![1.0, 1.0],
            constraints: vec![Constraint { a: vec![1.0, 1.0], op: Relation::Ge, b: 1.0 }],
        };
        let res = solve_two_phase(&model).unwrap();
        assert_eq!(res.status, Status::Unbounded);
    }

    #[test]
    fn remove_columns_shifts_basis() {
        let t = Tableau::new(
            vec![
                vec![1.0, 2.0, 3.0, 4.0, 5.0],
                vec![6.0, 7.0, 8.0, 9.0, 10.0],
            ],
            vec![Some(3)],
        );
        let names = vec!["x1".to_string(), "s1".to_string(), "a1".to_string(), "a2".to_string()];
        let (t2, names2) = remove_columns(&t, &[2], &names);
        assert_eq!(t2.width(), 4);
        assert_eq!(t2.rows[0], vec![1.0, 2.0, 4.0, 5.0]);
        assert_eq!(t2.basis, vec![Some(2)]);
        assert_eq!(names2, vec!["x1", "s1", "a2"]);
    }
}
