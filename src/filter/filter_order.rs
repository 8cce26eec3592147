use serde_json::Value;

use super::error::FilterError;
use super::types::{find_column, Column, FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"name desc, level"`, `["name desc"]` or `{ "name": "desc" }`.
    pub fn validate_and_parse(order: &Value, table: &str, columns: &[Column]) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => arr
                .iter()
                .filter_map(Value::as_str)
                .flat_map(Self::parse_order_string)
                .collect(),
            Value::Object(obj) => obj
                .iter()
                .map(|(k, v)| FilterOrderInfo {
                    column: k.clone(),
                    sort: Self::direction(v.as_str().unwrap_or("asc")),
                })
                .collect(),
            _ => vec![],
        };

        for info in &infos {
            if find_column(columns, &info.column).is_none() {
                return Err(FilterError::UnknownColumn { table: table.to_string(), column: info.column.clone() });
            }
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let mut it = part.split_whitespace();
            if let Some(col) = it.next() {
                out.push(FilterOrderInfo {
                    column: col.to_string(),
                    sort: Self::direction(it.next().unwrap_or("asc")),
                });
            }
        }
        out
    }

    fn direction(s: &str) -> SortDirection {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{col, SqlType};
    use serde_json::json;

    const COLUMNS: &[Column] = &[col("name", SqlType::Text), col("order_no", SqlType::Integer)];

    #[test]
    fn parses_all_three_forms() {
        let from_str = FilterOrder::validate_and_parse(&json!("order_no, name desc"), "menus", COLUMNS).unwrap();
        let from_arr = FilterOrder::validate_and_parse(&json!(["order_no", "name desc"]), "menus", COLUMNS).unwrap();
        assert_eq!(from_str, from_arr);
        assert_eq!(from_str[1].sort, SortDirection::Desc);

        let from_obj = FilterOrder::validate_and_parse(&json!({ "name": "DESC" }), "menus", COLUMNS).unwrap();
        assert_eq!(FilterOrder::generate(&from_obj), "ORDER BY \"name\" DESC");
    }

    #[test]
    fn rejects_unknown_column() {
        assert!(FilterOrder::validate_and_parse(&json!("secret"), "menus", COLUMNS).is_err());
    }
}
