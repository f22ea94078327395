use serde::{Deserialize, Serialize};

use crate::dual::DualMapping;
use crate::error::LpError;
use crate::simplex::{IterationRecord, Tableau};

/// Optimisation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "min")]
    Min,
}

/// Relational operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
}

/// A single linear constraint `a . x (op) b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub a: Vec<f64>,
    pub op: Relation,
    pub b: f64,
}

impl Constraint {
    /// Returns a copy with a non-negative right-hand side.
    ///
    /// A negative `b` flips the whole row: coefficients are negated and the
    /// relation swaps between `<=` and `>=` (`=` is unchanged).
    pub fn normalized(&self) -> Constraint {
        if self.b >= 0.0 {
            return self.clone();
        }
        let op = match self.op {
            Relation::Le => Relation::Ge,
            Relation::Ge => Relation::Le,
            Relation::Eq => Relation::Eq,
        };
        Constraint {
            a: self.a.iter().map(|v| -v).collect(),
            op,
            b: -self.b,
        }
    }
}

/// A linear program over implicitly non-negative variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpModel {
    #[serde(default = "default_name")]
    pub name: String,
    pub sense: Sense,
    pub c: Vec<f64>,
    pub constraints: Vec<Constraint>,
}

fn default_name() -> String {
    "LP".to_string()
}

impl LpModel {
    /// Builds a model from a JSON value and validates its shape.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, LpError> {
        let model: LpModel =
            serde_json::from_value(value.clone()).map_err(|e| LpError::Model(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    /// Checks that every constraint row matches the objective's width.
    pub fn validate(&self) -> Result<(), LpError> {
        if self.c.is_empty() {
            return Err(LpError::Model("objective has no coefficients".to_string()));
        }
        for (i, cst) in self.constraints.iter().enumerate() {
            if cst.a.len() != self.c.len() {
                return Err(LpError::Model(format!(
                    "constraint {} has {} coefficients, expected {}",
                    i,
                    cst.a.len(),
                    self.c.len()
                )));
            }
        }
        Ok(())
    }

    pub fn num_variables(&self) -> usize {
        self.c.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

/// Terminal status of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OPTIMAL")]
    Optimal,
    #[serde(rename = "INFEASIBLE")]
    Infeasible,
    #[serde(rename = "UNBOUNDED")]
    Unbounded,
}

/// Result of an LP solve.
///
/// `x` is zero-filled unless the status is optimal. The objective value is
/// NaN on infeasible exits and +inf on unbounded ones (the solvers work in
/// maximisation form internally).
#[derive(Debug, Clone)]
pub struct LpSolution {
    pub status: Status,
    pub x: Vec<f64>,
    pub objective_value: f64,
    pub iterations: usize,
    pub message: String,
    pub method_used: String,
    pub extra: Option<SolveInfo>,
}

impl LpSolution {
    pub fn unbounded(n: usize, iterations: usize, method: &str) -> Self {
        Self {
            status: Status::Unbounded,
            x: vec![0.0; n],
            objective_value: f64::INFINITY,
            iterations,
            message: LpError::Unbounded.to_string(),
            method_used: method.to_string(),
            extra: None,
        }
    }

    pub fn infeasible(n: usize, iterations: usize, message: &str, method: &str) -> Self {
        Self {
            status: Status::Infeasible,
            x: vec![0.0; n],
            objective_value: f64::NAN,
            iterations,
            message: message.to_string(),
            method_used: method.to_string(),
            extra: None,
        }
    }
}

/// Iteration history of a single simplex run, kept for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TableauHistory {
    pub label: String,
    pub var_names: Vec<String>,
    pub items: Vec<IterationRecord>,
}

/// Final-tableau bundle attached to optimal solutions.
#[derive(Debug, Clone, Serialize)]
pub struct SolveInfo {
    pub final_tableau: Vec<Vec<f64>>,
    pub basis: Vec<Option<usize>>,
    pub var_names: Vec<String>,
    pub basic_vars: Vec<String>,
    pub nonbasic_vars: Vec<String>,
    pub row0: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tableau_history: Option<TableauHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dual_mapping: Option<DualMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dual_model_name: Option<String>,
}

impl SolveInfo {
    /// Snapshot of a final tableau together with readable variable names.
    pub fn from_tableau(t: &Tableau, var_names: Vec<String>) -> Self {
        let basic_vars = t
            .basis
            .iter()
            .map(|b| match b {
                Some(col) if *col < var_names.len() => var_names[*col].clone(),
                _ => "?".to_string(),
            })
            .collect();
        let nonbasic_vars = (0..var_names.len())
            .filter(|j| !t.basis.contains(&Some(*j)))
            .map(|j| var_names[j].clone())
            .collect();
        let row0 = t.rows[0][..t.rows[0].len() - 1].to_vec();
        Self {
            final_tableau: t.rows.clone(),
            basis: t.basis.clone(),
            var_names,
            basic_vars,
            nonbasic_vars,
            row0,
            tableau_history: None,
            dual_mapping: None,
            dual_model_name: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            final_tableau: Vec::new(),
            basis: Vec::new(),
            var_names: Vec::new(),
            basic_vars: Vec::new(),
            nonbasic_vars: Vec::new(),
            row0: Vec::new(),
            tableau_history: None,
            dual_mapping: None,
            dual_model_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizing_flips_negative_rhs() {
        let cst = Constraint {
            a: vec![1.0, -2.0],
            op: Relation::Le,
            b: -3.0,
        };
        let norm = cst.normalized();
        assert_eq!(norm.op, Relation::Ge);
        assert_eq!(norm.a, vec![-1.0, 2.0]);
        assert_eq!(norm.b, 3.0);
    }

    #[test]
    fn validate_rejects_ragged_constraints() {
        let model = LpModel {
            name: "bad".to_string(),
            sense: Sense::Max,
            c: vec![1.0, 2.0],
            constraints: vec![Constraint {
                a: vec![1.0],
                op: Relation::Le,
                b: 1.0,
            }],
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn model_parses_from_json() {
        let value = serde_json::json!({
            "name": "demo",
            "sense": "max",
            "c": [3, 5],
            "constraints": [
                {"a": [1, 0], "op": "<=", "b": 4},
                {"a": [0, 2], "op": ">=", "b": 12},
            ]
        });
        let model = LpModel::from_value(&value).unwrap();
        assert_eq!(model.sense, Sense::Max);
        assert_eq!(model.constraints[1].op, Relation::Ge);
    }
}
