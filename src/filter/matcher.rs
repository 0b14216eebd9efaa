use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{parse_field_condition, FilterWhere};
use super::types::{FilterData, FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};

/// Evaluates a `FilterData` against in-process rows, with the same
/// semantics `FilterWhere`/`FilterOrder` give the SQL backend.
#[derive(Debug, Clone)]
pub struct FilterMatcher {
    where_data: Option<Value>,
    order: Vec<FilterOrderInfo>,
    limit: Option<usize>,
    offset: usize,
}

impl FilterMatcher {
    pub fn new(data: FilterData) -> Result<Self, FilterError> {
        if let Some(ref where_data) = data.where_clause {
            FilterWhere::validate(where_data)?;
        }
        let order = match data.order {
            Some(ref spec) => FilterOrder::validate_and_parse(spec)?,
            None => vec![],
        };
        let limit = match data.limit {
            Some(l) if l < 0 => return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())),
            Some(l) => Some(l as usize),
            None => None,
        };
        let offset = match data.offset {
            Some(o) if o < 0 => return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())),
            Some(o) => o as usize,
            None => 0,
        };
        Ok(Self { where_data: data.where_clause, order, limit, offset })
    }

    /// Filter, order and page `rows`
    pub fn apply<T, I>(&self, rows: I) -> Result<Vec<T>, FilterError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let mut matched = Vec::new();
        for row in rows {
            let value = serde_json::to_value(&row)?;
            if self.matches(&value)? {
                matched.push((value, row));
            }
        }

        if !self.order.is_empty() {
            matched.sort_by(|(a, _), (b, _)| self.compare_rows(a, b));
        }

        let page = matched.into_iter().skip(self.offset).map(|(_, row)| row);
        Ok(match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }

    pub fn matches(&self, row: &Value) -> Result<bool, FilterError> {
        match self.where_data {
            Some(ref where_data) => eval_clause(where_data, row),
            None => Ok(true),
        }
    }

    fn compare_rows(&self, a: &Value, b: &Value) -> Ordering {
        for info in &self.order {
            let left = a.get(&info.column).unwrap_or(&Value::Null);
            let right = b.get(&info.column).unwrap_or(&Value::Null);
            let ord = compare_values(left, right).unwrap_or(Ordering::Equal);
            let ord = match info.sort {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn eval_clause(where_data: &Value, row: &Value) -> Result<bool, FilterError> {
    let obj = match where_data {
        Value::Null => return Ok(true),
        Value::Object(obj) => obj,
        _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
    };

    for (key, value) in obj {
        let matched = if key.starts_with('$') {
            eval_logical(key, value, row)?
        } else {
            let mut all = true;
            for info in parse_field_condition(key, value)? {
                if !eval_condition(&info, row) {
                    all = false;
                    break;
                }
            }
            all
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_logical(op: &str, value: &Value, row: &Value) -> Result<bool, FilterError> {
    match op {
        "$and" | "$or" => {
            let arr = value
                .as_array()
                .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
            let mut results = Vec::with_capacity(arr.len());
            for v in arr {
                results.push(eval_clause(v, row)?);
            }
            Ok(if op == "$and" {
                results.into_iter().all(|r| r)
            } else {
                results.into_iter().any(|r| r)
            })
        }
        "$not" => Ok(!eval_clause(value, row)?),
        _ => Err(FilterError::UnsupportedOperator(op.to_string())),
    }
}

fn eval_condition(info: &FilterWhereInfo, row: &Value) -> bool {
    let field = row.get(&info.column).unwrap_or(&Value::Null);
    match info.operator {
        FilterOp::Eq => values_equal(field, &info.data),
        FilterOp::Ne => !values_equal(field, &info.data),
        FilterOp::Gt => compare_values(field, &info.data) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare_values(field, &info.data), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare_values(field, &info.data) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare_values(field, &info.data), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::In | FilterOp::NIn => {
            let found = match &info.data {
                Value::Array(values) => values.iter().any(|v| values_equal(field, v)),
                other => values_equal(field, other),
            };
            found == (info.operator == FilterOp::In)
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        _ => compare_values(a, b) == Some(Ordering::Equal),
    }
}

/// Numbers compare numerically (numeric strings included, e.g. decimals),
/// strings by code point (Postgres `COLLATE "C"`), nulls sort first.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
