use serde_json::Value;

use super::error::FilterError;
use super::filter::is_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Compiles a JSON where-document into a parameterized Postgres predicate.
///
/// `{ "user_id": "...", "id": { "$in": [...] }, "$or": [ {...}, {...} ] }`
/// becomes `"user_id"::text = $1 AND "id"::text IN ($2, $3) AND ((...) OR (...))`.
/// String values are compared against the column's text form so uuid and
/// text columns bind the same way.
pub struct FilterWhere {
    param_values: Vec<Value>,
}

impl FilterWhere {
    pub fn generate(where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self { param_values: vec![] };
        let sql = filter_where.build_clause(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build_clause(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(self.logical_operator(key, value)?);
            } else {
                for info in parse_field_condition(key, value)? {
                    parts.push(self.build_sql_condition(&info)?);
                }
            }
        }

        if parts.is_empty() {
            Ok("1=1".to_string())
        } else {
            Ok(parts.join(" AND "))
        }
    }

    fn logical_operator(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.build_clause(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build_clause(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = column_expr(&condition.column, &condition.data);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() {
                    Ok(format!("{} IS NULL", column))
                } else {
                    Ok(format!("{} = {}", column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Ne => {
                if condition.data.is_null() {
                    Ok(format!("{} IS NOT NULL", column))
                } else {
                    Ok(format!("{} <> {}", column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Gt => Ok(format!("{} > {}", column, self.param(condition.data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", column, self.param(condition.data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", column, self.param(condition.data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", column, self.param(condition.data.clone()))),
            FilterOp::In | FilterOp::NIn => {
                let values = match &condition.data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                let negate = condition.operator == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                Ok(format!("{} {} ({})", column, keyword, params.join(", ")))
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

/// Break `{ field: value }` or `{ field: { "$op": value, ... } }` into conditions
pub(crate) fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
    if !is_identifier(field) {
        return Err(FilterError::InvalidColumn(field.to_string()));
    }

    match value {
        Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => obj
            .iter()
            .map(|(op_key, op_val)| {
                Ok(FilterWhereInfo {
                    column: field.to_string(),
                    operator: map_operator(op_key)?,
                    data: op_val.clone(),
                })
            })
            .collect(),
        // Implicit equality: { field: value }
        _ => Ok(vec![FilterWhereInfo {
            column: field.to_string(),
            operator: FilterOp::Eq,
            data: value.clone(),
        }]),
    }
}

pub(crate) fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
    Ok(match op_key {
        "$eq" => FilterOp::Eq,
        "$ne" | "$neq" => FilterOp::Ne,
        "$gt" => FilterOp::Gt,
        "$gte" => FilterOp::Gte,
        "$lt" => FilterOp::Lt,
        "$lte" => FilterOp::Lte,
        "$in" => FilterOp::In,
        "$nin" => FilterOp::NIn,
        other => return Err(FilterError::UnsupportedOperator(other.to_string())),
    })
}

fn column_expr(column: &str, data: &Value) -> String {
    let compares_text = match data {
        Value::String(_) => true,
        Value::Array(values) => values.iter().any(Value::is_string),
        _ => false,
    };
    if compares_text {
        format!("\"{}\"::text", column)
    } else {
        format!("\"{}\"", column)
    }
}
