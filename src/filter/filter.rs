use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::matcher;
use super::types::{Column, Condition, FilterData, FilterOrderInfo, SortDirection, SqlResult};

pub struct Filter {
    table_name: String,
    columns: &'static [Column],
    condition: Condition,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>, columns: &'static [Column]) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            columns,
            condition: Condition::always(),
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if data.limit.is_some() || data.offset.is_some() {
            self.limit(data.limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        self.condition = FilterWhere::parse(&conditions, &self.table_name, self.columns)?;
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec, &self.table_name, self.columns)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i32>, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit { if l < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); } }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit.unwrap_or(i32::MAX);
        let applied_limit = match limit {
            Some(l) if l > max_limit => {
                if crate::config::CONFIG.filter.debug_logging {
                    tracing::warn!("Limit {} exceeds max {}, capping to max", l, max_limit);
                }
                Some(max_limit)
            }
            other => other,
        };

        self.limit = applied_limit;
        self.offset = offset;
        Ok(self)
    }

    /// Falls back to `column ASC` when no explicit order was given.
    pub fn default_order(&mut self, column: &str) -> &mut Self {
        if self.order_data.is_empty() {
            self.order_data.push(FilterOrderInfo { column: column.to_string(), sort: SortDirection::Asc });
        }
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(&self.condition, self.columns, 0)?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let (query, params) = FilterWhere::generate(&self.condition, self.columns, starting_param_index)?;
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.table_name, where_result.query),
            params: where_result.params,
        })
    }

    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        Ok(SqlResult {
            query: format!("DELETE FROM \"{}\" WHERE {}", self.table_name, where_result.query),
            params: where_result.params,
        })
    }

    /// Evaluate the WHERE tree against a row keyed by column name.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        matcher::matches(&self.condition, row, self.columns)
    }

    pub fn compare(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        matcher::compare_rows(a, b, &self.order_data)
    }

    /// `(offset, limit)` for in-memory slicing.
    pub fn window(&self) -> (usize, Option<usize>) {
        (
            self.offset.unwrap_or(0).max(0) as usize,
            self.limit.map(|l| l.max(0) as usize),
        )
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        match chars.next() {
            None => Err(FilterError::InvalidTableName("Table name cannot be empty".to_string())),
            Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
                Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)))
            }
            _ if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)))
            }
            _ => Ok(()),
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{col, SqlType};
    use serde_json::json;

    const COLUMNS: &[Column] = &[col("id", SqlType::Uuid), col("name", SqlType::Text), col("order_no", SqlType::Integer)];

    #[test]
    fn select_sql_includes_order_and_window() {
        let mut filter = Filter::new("menus", COLUMNS).unwrap();
        filter
            .assign(FilterData::where_(json!({ "name": { "$ilike": "sys%" } })).order_by("order_no").page(10, 20))
            .unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"menus\" WHERE \"name\"::text ILIKE $1::text ORDER BY \"order_no\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![json!("sys%")]);
    }

    #[test]
    fn count_and_delete_ignore_window() {
        let mut filter = Filter::new("menus", COLUMNS).unwrap();
        filter.assign(FilterData::where_(json!({ "name": "a" })).page(5, 0)).unwrap();
        assert_eq!(filter.to_count_sql().unwrap().query, "SELECT COUNT(*) as count FROM \"menus\" WHERE \"name\" = $1::text");
        assert_eq!(filter.to_delete_sql().unwrap().query, "DELETE FROM \"menus\" WHERE \"name\" = $1::text");
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("", COLUMNS).is_err());
        assert!(Filter::new("menus; drop", COLUMNS).is_err());
        assert!(Filter::new("1menus", COLUMNS).is_err());
    }

    #[test]
    fn negative_limit_is_rejected() {
        let mut filter = Filter::new("menus", COLUMNS).unwrap();
        assert!(filter.limit(Some(-1), None).is_err());
    }
}
