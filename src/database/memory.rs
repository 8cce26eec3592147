use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::record::Record;
use crate::database::table::Table;
use crate::filter::{Filter, FilterData};

/// Process-local [`Table`] used by `STORE=memory` and the test suites.
/// Evaluates the same filter grammar as the SQL backend and enforces the
/// record's unique column groups.
pub struct MemoryTable<T> {
    rows: RwLock<Vec<T>>,
}

impl<T: Record> Default for MemoryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryTable<T> {
    pub fn new() -> Self {
        Self { rows: RwLock::new(Vec::new()) }
    }

    fn compile(filter_data: FilterData) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(T::TABLE, T::COLUMNS)?;
        filter.assign(filter_data)?;
        filter.default_order(T::DEFAULT_ORDER);
        Ok(filter)
    }

    fn check_unique(rows: &[T], candidate: &T, skip: Option<usize>) -> Result<(), DatabaseError> {
        let candidate_row = candidate.row();
        for group in T::UNIQUE {
            let key: Vec<&Value> = group.iter().map(|c| candidate_row.get(*c).unwrap_or(&Value::Null)).collect();
            if key.iter().any(|v| v.is_null()) {
                continue;
            }
            let clash = rows.iter().enumerate().any(|(i, existing)| {
                if Some(i) == skip {
                    return false;
                }
                let existing_row = existing.row();
                group
                    .iter()
                    .zip(&key)
                    .all(|(c, v)| existing_row.get(*c) == Some(*v))
            });
            if clash {
                return Err(DatabaseError::Conflict(format!(
                    "unique constraint {}_{}_key violated",
                    T::TABLE,
                    group.join("_")
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> Table<T> for MemoryTable<T> {
    async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        let filter = Self::compile(filter_data)?;
        let rows = self.rows.read().await;

        let mut hits: Vec<_> = rows
            .iter()
            .map(|r| (r.row(), r))
            .filter(|(row, _)| filter.matches(row))
            .collect();
        hits.sort_by(|a, b| filter.compare(&a.0, &b.0));

        let (offset, limit) = filter.window();
        Ok(hits
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        let filter = Self::compile(filter_data)?;
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| filter.matches(&r.row())).count() as i64)
    }

    async fn insert(&self, record: T) -> Result<T, DatabaseError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.id() == record.id()) {
            return Err(DatabaseError::Conflict(format!("{}_pkey violated", T::TABLE)));
        }
        Self::check_unique(&rows, &record, None)?;
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T, DatabaseError> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|r| r.id() == record.id())
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, record.id())))?;
        Self::check_unique(&rows, &record, Some(index))?;
        rows[index] = record.clone();
        Ok(record)
    }

    async fn delete_where(&self, filter_data: FilterData) -> Result<u64, DatabaseError> {
        let filter = Self::compile(filter_data)?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !filter.matches(&r.row()));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Position, Role};
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn unique_groups_are_enforced() {
        let table = MemoryTable::<Role>::new();
        table.insert(Role::new("admin")).await.unwrap();
        let err = table.insert(Role::new("admin")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn composite_unique_allows_same_name_in_other_scope() {
        let table = MemoryTable::<Position>::new();
        let (org_a, org_b) = (Uuid::new_v4(), Uuid::new_v4());
        table.insert(Position::new("engineer", org_a)).await.unwrap();
        table.insert(Position::new("engineer", org_b)).await.unwrap();
        assert!(table.insert(Position::new("engineer", org_a)).await.is_err());
    }

    #[tokio::test]
    async fn update_can_keep_its_own_unique_value() {
        let table = MemoryTable::<Role>::new();
        let mut role = table.insert(Role::new("admin")).await.unwrap();
        role.name = "admin".to_string();
        table.update(role).await.unwrap();
    }

    #[tokio::test]
    async fn select_applies_order_and_window() {
        let table = MemoryTable::<Role>::new();
        for name in ["c", "a", "d", "b"] {
            table.insert(Role::new(name)).await.unwrap();
        }
        let page = table
            .select_any(FilterData::default().order_by("name").page(2, 1))
            .await
            .unwrap();
        let names: Vec<_> = page.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(table.count(FilterData::default().page(1, 0)).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn delete_reports_rows_removed() {
        let table = MemoryTable::<Role>::new();
        let role = table.insert(Role::new("ops")).await.unwrap();
        assert_eq!(table.delete_by_id(role.id).await.unwrap(), 1);
        assert_eq!(table.delete_by_id(role.id).await.unwrap(), 0);
        assert!(table.select_any(FilterData::where_(json!({ "name": "ops" }))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let table = MemoryTable::<Role>::new();
        let err = table.update(Role::new("ghost")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }
}
