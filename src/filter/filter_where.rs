use serde_json::Value;

use super::error::FilterError;
use super::types::{find_column, Column, Condition, FilterOp};

/// Parses the JSON WHERE grammar into a [`Condition`] and renders it as SQL.
pub struct FilterWhere<'a> {
    columns: &'a [Column],
    param_values: Vec<Value>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn new(columns: &'a [Column], starting_param_index: usize) -> Self {
        Self {
            columns,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Parse `where_data`, rejecting columns the table does not declare.
    pub fn parse(where_data: &Value, table: &str, columns: &[Column]) -> Result<Condition, FilterError> {
        match where_data {
            Value::Null => Ok(Condition::always()),
            Value::Object(obj) => {
                let mut conditions = Vec::with_capacity(obj.len());
                for (key, value) in obj {
                    if key.starts_with('$') {
                        conditions.push(Self::parse_logical_operator(key, value, table, columns)?);
                    } else {
                        Self::parse_field_condition(key, value, table, columns, &mut conditions)?;
                    }
                }
                if conditions.len() == 1 {
                    Ok(conditions.remove(0))
                } else {
                    Ok(Condition::All(conditions))
                }
            }
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_logical_operator(op: &str, value: &Value, table: &str, columns: &[Column]) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let parts = arr
                    .iter()
                    .map(|v| Self::parse(v, table, columns))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" { Condition::All(parts) } else { Condition::Any(parts) })
            }
            "$not" => Ok(Condition::Not(Box::new(Self::parse(value, table, columns)?))),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(
        field: &str,
        value: &Value,
        table: &str,
        columns: &[Column],
        out: &mut Vec<Condition>,
    ) -> Result<(), FilterError> {
        if find_column(columns, field).is_none() {
            return Err(FilterError::UnknownColumn { table: table.to_string(), column: field.to_string() });
        }

        match value {
            Value::Object(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => {
                for (op_key, op_val) in obj {
                    let op = FilterOp::from_key(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    Self::validate_operand(op, op_val)?;
                    out.push(Condition::Field { column: field.to_string(), op, data: op_val.clone() });
                }
            }
            // Implicit equality: { field: value }
            _ => out.push(Condition::Field { column: field.to_string(), op: FilterOp::Eq, data: value.clone() }),
        }
        Ok(())
    }

    fn validate_operand(op: FilterOp, data: &Value) -> Result<(), FilterError> {
        match op {
            FilterOp::In | FilterOp::NIn if !data.is_array() => {
                Err(FilterError::InvalidOperatorData("$in/$nin require an array".to_string()))
            }
            FilterOp::Between => match data.as_array() {
                Some(values) if values.len() == 2 => Ok(()),
                _ => Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
            },
            FilterOp::Null if !data.is_boolean() => {
                Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string()))
            }
            _ if op.is_pattern() && !data.is_string() => {
                Err(FilterError::InvalidOperatorData("pattern operators require a string".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Render a condition tree. Placeholders continue from `starting_param_index`.
    pub fn generate(
        condition: &Condition,
        columns: &'a [Column],
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(columns, starting_param_index);
        let sql = filter_where.build(condition)?;
        Ok((sql, filter_where.param_values))
    }

    fn build(&mut self, condition: &Condition) -> Result<String, FilterError> {
        match condition {
            Condition::All(parts) => self.join(parts, " AND ", "1=1"),
            Condition::Any(parts) => self.join(parts, " OR ", "1=0"),
            Condition::Not(inner) => Ok(format!("NOT ({})", self.build(inner)?)),
            Condition::Field { column, op, data } => self.build_field(column, *op, data),
        }
    }

    fn join(&mut self, parts: &[Condition], joiner: &str, empty: &str) -> Result<String, FilterError> {
        match parts.len() {
            0 => Ok(empty.to_string()),
            1 => self.build(&parts[0]),
            _ => {
                let mut sql_parts = Vec::with_capacity(parts.len());
                for part in parts {
                    sql_parts.push(format!("({})", self.build(part)?));
                }
                Ok(sql_parts.join(joiner))
            }
        }
    }

    fn build_field(&mut self, column: &str, op: FilterOp, data: &Value) -> Result<String, FilterError> {
        let cast = find_column(self.columns, column)
            .map(|c| c.sql_type.cast())
            .ok_or_else(|| FilterError::InvalidWhereClause(format!("unknown column {}", column)))?;
        let quoted_column = format!("\"{}\"", column);

        Ok(match op {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Ne => format!("{} <> {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Like => format!("{}::text LIKE {}", quoted_column, self.param(data.clone(), "text")),
            FilterOp::NLike => format!("{}::text NOT LIKE {}", quoted_column, self.param(data.clone(), "text")),
            FilterOp::ILike => format!("{}::text ILIKE {}", quoted_column, self.param(data.clone(), "text")),
            FilterOp::NILike => format!("{}::text NOT ILIKE {}", quoted_column, self.param(data.clone(), "text")),
            FilterOp::In | FilterOp::NIn => {
                let values = data.as_array().cloned().unwrap_or_default();
                if values.is_empty() {
                    return Ok(if op == FilterOp::In { "1=0" } else { "1=1" }.to_string());
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v, cast)).collect();
                let keyword = if op == FilterOp::In { "IN" } else { "NOT IN" };
                format!("{} {} ({})", quoted_column, keyword, params.join(", "))
            }
            FilterOp::Between => {
                let values = data
                    .as_array()
                    .filter(|v| v.len() == 2)
                    .ok_or_else(|| FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string()))?;
                let low = self.param(values[0].clone(), cast);
                let high = self.param(values[1].clone(), cast);
                format!("{} BETWEEN {} AND {}", quoted_column, low, high)
            }
            FilterOp::Null => {
                if data.as_bool().unwrap_or(true) {
                    format!("{} IS NULL", quoted_column)
                } else {
                    format!("{} IS NOT NULL", quoted_column)
                }
            }
        })
    }

    fn param(&mut self, value: Value, cast: &str) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}::{}", self.param_index, cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{col, SqlType};
    use serde_json::json;

    const COLUMNS: &[Column] = &[
        col("id", SqlType::Uuid),
        col("name", SqlType::Text),
        col("level", SqlType::Integer),
        col("parent_id", SqlType::Uuid),
    ];

    fn render(where_data: Value) -> (String, Vec<Value>) {
        let condition = FilterWhere::parse(&where_data, "organizations", COLUMNS).unwrap();
        FilterWhere::generate(&condition, COLUMNS, 0).unwrap()
    }

    #[test]
    fn implicit_equality_casts_parameter() {
        let (sql, params) = render(json!({ "name": "ops" }));
        assert_eq!(sql, "\"name\" = $1::text");
        assert_eq!(params, vec![json!("ops")]);
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let (sql, params) = render(json!({ "parent_id": null }));
        assert_eq!(sql, "\"parent_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn nested_logical_operators_share_parameter_numbering() {
        let (sql, params) = render(json!({
            "$or": [ { "level": { "$gte": 2 } }, { "name": { "$like": "a%" } } ],
            "parent_id": { "$null": false }
        }));
        assert_eq!(
            sql,
            "((\"level\" >= $1::integer) OR (\"name\"::text LIKE $2::text)) AND (\"parent_id\" IS NOT NULL)"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, _) = render(json!({ "id": { "$in": [] } }));
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = FilterWhere::parse(&json!({ "password": "x" }), "organizations", COLUMNS).unwrap_err();
        assert!(matches!(err, FilterError::UnknownColumn { .. }));
    }

    #[test]
    fn unsupported_operator_is_rejected() {
        let err = FilterWhere::parse(&json!({ "name": { "$regex": "x" } }), "organizations", COLUMNS).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator(_)));
    }
}
