use serde::Deserialize;

use crate::error::TransportError;

/// Penalty constant substituted for the `"M"` cost sentinel.
pub const BIG_M: f64 = 1_000_000_000.0;

/// A cost or quantity cell as it appears in JSON: a number, or a string
/// holding either `"M"` or a numeric literal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Resolves the cell to a float, mapping `"M"` (any case) to [`BIG_M`].
    pub fn resolve(&self) -> Result<f64, TransportError> {
        match self {
            CellValue::Number(v) => Ok(*v),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("m") {
                    return Ok(BIG_M);
                }
                trimmed
                    .parse()
                    .map_err(|_| TransportError::Model(format!("invalid numeric value: {s:?}")))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TransportModelDto {
    supply: Vec<CellValue>,
    demand: Vec<CellValue>,
    costs: Vec<Vec<CellValue>>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    origins: Option<Vec<String>>,
    #[serde(default)]
    destinations: Option<Vec<String>>,
}

/// A transportation problem: `m` origins with supplies, `n` destinations
/// with demands, and an `m x n` cost matrix.
#[derive(Debug, Clone)]
pub struct TransportModel {
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
    pub costs: Vec<Vec<f64>>,
    pub name: String,
    pub origins: Option<Vec<String>>,
    pub destinations: Option<Vec<String>>,
}

impl TransportModel {
    /// Builds a model from a JSON value, resolving `"M"` sentinels and
    /// checking that the cost matrix matches the supply/demand sizes.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, TransportError> {
        if !value.is_object() {
            return Err(TransportError::Model("model must be an object".to_string()));
        }
        let dto: TransportModelDto = serde_json::from_value(value.clone())
            .map_err(|e| TransportError::Model(e.to_string()))?;

        let supply = dto
            .supply
            .iter()
            .map(CellValue::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let demand = dto
            .demand
            .iter()
            .map(CellValue::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let costs = dto
            .costs
            .iter()
            .map(|row| row.iter().map(CellValue::resolve).collect())
            .collect::<Result<Vec<Vec<_>>, _>>()?;

        if costs.len() != supply.len() {
            return Err(TransportError::Model(
                "rows of costs must match the number of origins".to_string(),
            ));
        }
        if costs.iter().any(|row| row.len() != demand.len()) {
            return Err(TransportError::Model(
                "columns of costs must match the number of destinations".to_string(),
            ));
        }

        Ok(TransportModel {
            supply,
            demand,
            costs,
            name: dto.name.unwrap_or_else(|| "transport".to_string()),
            origins: dto.origins,
            destinations: dto.destinations,
        })
    }
}
