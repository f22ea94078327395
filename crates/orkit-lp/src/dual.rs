use serde::Serialize;

use crate::model::{Constraint, LpModel, Relation, Sense};

/// How the expanded dual variables map back onto the primal constraints.
///
/// Each primal constraint expands into one or two non-negative dual
/// variables: `(index, sign)` terms such that the original dual value is
/// `sum(sign * y_index)`. Equality constraints split into `y+ - y-`.
#[derive(Debug, Clone, Serialize)]
pub struct DualMapping {
    pub expanded_dual_vars: usize,
    pub per_constraint_map: Vec<Vec<(usize, f64)>>,
}

/// Builds the dual of a primal with non-negative variables.
///
/// Constraint handling for a maximising primal (mirrored for min):
/// `<=` gives `y >= 0`, `>=` gives `y <= 0` (stored as `-y'`), `=` gives a
/// free variable (stored split). Right-hand sides are made non-negative
/// first, as in the other builders. Free primal variables are unsupported.
pub fn build_dual(primal: &LpModel) -> (LpModel, DualMapping) {
    let cons: Vec<Constraint> = primal.constraints.iter().map(|c| c.normalized()).collect();
    let m = cons.len();
    let n = primal.c.len();

    let dual_sense = match primal.sense {
        Sense::Max => Sense::Min,
        Sense::Min => Sense::Max,
    };

    let mut var_map: Vec<Vec<(usize, f64)>> = Vec::with_capacity(m);
    let mut new_var_count = 0;
    for cst in &cons {
        match cst.op {
            Relation::Le => {
                let sign = if primal.sense == Sense::Max { 1.0 } else { -1.0 };
                var_map.push(vec![(new_var_count, sign)]);
                new_var_count += 1;
            }
            Relation::Ge => {
                let sign = if primal.sense == Sense::Max { -1.0 } else { 1.0 };
                var_map.push(vec![(new_var_count, sign)]);
                new_var_count += 1;
            }
            Relation::Eq => {
                var_map.push(vec![(new_var_count, 1.0), (new_var_count + 1, -1.0)]);
                new_var_count += 2;
            }
        }
    }

    // Dual objective: b^T y over the expansion.
    let mut dual_c = vec![0.0; new_var_count];
    for (i, cst) in cons.iter().enumerate() {
        for &(k, sign) in &var_map[i] {
            dual_c[k] += cst.b * sign;
        }
    }

    // Dual constraints: A^T y >= c for a maximising primal, <= for min.
    let op = match primal.sense {
        Sense::Max => Relation::Ge,
        Sense::Min => Relation::Le,
    };
    let mut dual_constraints = Vec::with_capacity(n);
    for j in 0..n {
        let mut coeff = vec![0.0; new_var_count];
        for (i, cst) in cons.iter().enumerate() {
            let aij = cst.a[j];
            for &(k, sign) in &var_map[i] {
                coeff[k] += aij * sign;
            }
        }
        dual_constraints.push(Constraint {
            a: coeff,
            op,
            b: primal.c[j],
        });
    }

    let dual_model = LpModel {
        name: format!("DUAL({})", primal.name),
        sense: dual_sense,
        c: dual_c,
        constraints: dual_constraints,
    };

    let mapping = DualMapping {
        expanded_dual_vars: new_var_count,
        per_constraint_map: var_map,
    };
    (dual_model, mapping)
}

/// Reconstructs one shadow price per primal constraint from the solved
/// dual's expanded variable values.
pub fn shadow_prices(mapping: &DualMapping, dual_x: &[f64]) -> Vec<f64> {
    mapping
        .per_constraint_map
        .iter()
        .map(|terms| {
            terms
                .iter()
                .map(|&(k, sign)| {
                    if k < dual_x.len() {
                        sign * dual_x[k]
                    } else {
                        0.0
                    }
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::{solve_lp, Method};

    #[test]
    fn dual_of_max_le_is_min_ge() {
        // max 3x + 2y s.t. 2x + y <= 8, x + 2y <= 6
        let primal = LpModel {
            name: "p".to_string(),
            sense: Sense::Max,
            c: vec![3.0, 2.0],
            constraints: vec![
                Constraint { a: vec![2.0, 1.0], op: Relation::Le, b: 8.0 },
                Constraint { a: vec![1.0, 2.0], op: Relation::Le, b: 6.0 },
            ],
        };
        let (dual, mapping) = build_dual(&primal);
        assert_eq!(dual.sense, Sense::Min);
        assert_eq!(dual.c, vec![8.0, 6.0]);
        assert_eq!(dual.constraints.len(), 2);
        assert_eq!(dual.constraints[0].op, Relation::Ge);
        assert_eq!(dual.constraints[0].a, vec![2.0, 1.0]);
        assert_eq!(dual.constraints[0].b, 3.0);
        assert_eq!(mapping.expanded_dual_vars, 2);
        assert_eq!(mapping.per_constraint_map[0], vec![(0, 1.0)]);
    }

    #[test]
    fn ge_and_eq_rows_expand_with_signs() {
        let primal = LpModel {
            name: "p".to_string(),
            sense: Sense::Max,
            c: vec![1.0],
            constraints: vec![
                Constraint { a: vec![1.0], op: Relation::Ge, b: 2.0 },
                Constraint { a: vec![1.0], op: Relation::Eq, b: 3.0 },
            ],
        };
        let (dual, mapping) = build_dual(&primal);
        // >= row keeps one flipped variable, = row splits in two.
        assert_eq!(mapping.expanded_dual_vars, 3);
        assert_eq!(mapping.per_constraint_map[0], vec![(0, -1.0)]);
        assert_eq!(mapping.per_constraint_map[1], vec![(1, 1.0), (2, -1.0)]);
        assert_eq!(dual.c, vec![-2.0, 3.0, -3.0]);
        assert_eq!(dual.constraints[0].a, vec![-1.0, 1.0, -1.0]);
    }

    #[test]
    fn strong_duality_on_classic_model() {
        let primal = LpModel {
            name: "classic".to_string(),
            sense: Sense::Max,
            c: vec![3.0, 5.0],
            constraints: vec![
                Constraint { a: vec![1.0, 0.0], op: Relation::Le, b: 4.0 },
                Constraint { a: vec![0.0, 2.0], op: Relation::Le, b: 12.0 },
                Constraint { a: vec![3.0, 2.0], op: Relation::Le, b: 18.0 },
            ],
        };
        let primal_res = solve_lp(&primal, Method::Auto).unwrap();
        let (dual, mapping) = build_dual(&primal);
        let dual_res = solve_lp(&dual, Method::TwoPhase).unwrap();
        assert!((primal_res.objective_value - dual_res.objective_value).abs() < 1e-6);
        // Shadow price of the non-binding first constraint is zero.
        let prices = shadow_prices(&mapping, &dual_res.x);
        assert_eq!(prices.len(), 3);
        assert!(prices[0].abs() < 1e-6);
    }

    #[test]
    fn shadow_prices_apply_signs() {
        let mapping = DualMapping {
            expanded_dual_vars: 3,
            per_constraint_map: vec![vec![(0, -1.0)], vec![(1, 1.0), (2, -1.0)]],
        };
        let prices = shadow_prices(&mapping, &[2.0, 5.0, 1.5]);
        assert_eq!(prices, vec![-2.0, 3.5]);
    }
}
