use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config;
use crate::database::{DatabaseError, Record, Table};
use crate::filter::{FilterData, SortDirection};

/// Paging request, read from `?pageNumber=&pageSize=&sort=`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page_number: i64,
    pub page_size: i64,
    pub sort: SortDirection,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: config::config().pagination.default_page_size,
            sort: SortDirection::Desc,
        }
    }
}

impl Pagination {
    /// Clamp to `1..=max_page_size` rows and to pages whose offset fits an `i32`.
    pub fn normalized(&self) -> Self {
        let paging = &config::config().pagination;
        let page_size = if self.page_size <= 0 { paging.default_page_size } else { self.page_size };
        let page_size = page_size.min(paging.max_page_size).min(i32::MAX as i64).max(1);
        let last_page = i32::MAX as i64 / page_size + 1;
        Self {
            page_number: self.page_number.clamp(1, last_page),
            page_size,
            sort: self.sort,
        }
    }

    pub fn offset(&self) -> i64 {
        self.page_number.saturating_sub(1).saturating_mul(self.page_size).max(0)
    }

    /// Window and order `filter` for this page.
    pub fn apply(&self, filter: FilterData, order_column: &str) -> FilterData {
        let order = format!("{} {}", order_column, self.sort.to_sql());
        let limit = i32::try_from(self.page_size).unwrap_or(i32::MAX);
        let offset = i32::try_from(self.offset()).unwrap_or(i32::MAX);
        filter.order_by(order).page(limit, offset)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    pub page_size: i64,
    pub page_number: i64,
    pub total_page: i64,
    pub total: i64,
    pub data: Vec<T>,
}

impl<T> QueryResponse<T> {
    pub fn new(page: &Pagination, total: i64, data: Vec<T>) -> Self {
        let total_page = if page.page_size > 0 { (total + page.page_size - 1) / page.page_size } else { 0 };
        Self {
            page_size: page.page_size,
            page_number: page.page_number,
            total_page,
            total,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> QueryResponse<U> {
        QueryResponse {
            page_size: self.page_size,
            page_number: self.page_number,
            total_page: self.total_page,
            total: self.total,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

/// Count the matches, then fetch one page of them.
pub async fn paginate<T: Record>(
    table: &dyn Table<T>,
    where_clause: Value,
    page: &Pagination,
    order_column: &str,
) -> Result<QueryResponse<T>, DatabaseError> {
    let page = page.normalized();
    let total = table.count(FilterData::where_(where_clause.clone())).await?;
    let data = table
        .select_any(page.apply(FilterData::where_(where_clause), order_column))
        .await?;
    Ok(QueryResponse::new(&page, total, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::database::MemoryTable;
    use serde_json::json;

    #[test]
    fn total_page_rounds_up() {
        let page = Pagination { page_number: 1, page_size: 10, sort: SortDirection::Desc };
        assert_eq!(QueryResponse::<()>::new(&page, 0, vec![]).total_page, 0);
        assert_eq!(QueryResponse::<()>::new(&page, 10, vec![]).total_page, 1);
        assert_eq!(QueryResponse::<()>::new(&page, 11, vec![]).total_page, 2);
    }

    #[test]
    fn normalization_clamps_inputs() {
        let page = Pagination { page_number: 0, page_size: 10_000, sort: SortDirection::Asc }.normalized();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, config::config().pagination.max_page_size);
        assert_eq!(page.offset(), 0);

        let page = Pagination { page_number: 3, page_size: 0, sort: SortDirection::Asc }.normalized();
        assert_eq!(page.page_size, config::config().pagination.default_page_size);
    }

    #[tokio::test]
    async fn paginate_counts_all_and_returns_one_page() {
        let table = MemoryTable::<Role>::new();
        for i in 0..7 {
            table.insert(Role::new(format!("role{}", i))).await.unwrap();
        }
        let page = Pagination { page_number: 2, page_size: 3, sort: SortDirection::Asc };
        let result = paginate(&table, json!({ "name": { "$like": "role%" } }), &page, "name").await.unwrap();

        assert_eq!(result.total, 7);
        assert_eq!(result.total_page, 3);
        let names: Vec<_> = result.data.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["role3", "role4", "role5"]);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let page = Pagination { page_number: i64::MAX, page_size: 10, sort: SortDirection::Asc };
        assert_eq!(page.offset(), i64::MAX);

        let page = page.normalized();
        assert!(page.offset() <= i32::MAX as i64);
    }

    #[tokio::test]
    async fn pages_past_the_end_are_empty() {
        let table = MemoryTable::<Role>::new();
        for i in 0..3 {
            table.insert(Role::new(format!("role{}", i))).await.unwrap();
        }

        for page_number in [4, 300_000_000, i64::MAX] {
            let page = Pagination { page_number, page_size: 10, sort: SortDirection::Asc };
            let result = paginate(&table, json!({}), &page, "name").await.unwrap();
            assert_eq!(result.total, 3);
            assert!(result.data.is_empty(), "page {} should be empty", page_number);
        }
    }
}
