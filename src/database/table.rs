use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::record::Record;
use crate::filter::FilterData;

/// Storage operations over one record type. Implemented for Postgres by
/// [`Repository`](crate::database::repository::Repository) and in memory by
/// [`MemoryTable`](crate::database::memory::MemoryTable).
#[async_trait]
pub trait Table<T: Record>: Send + Sync {
    async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError>;

    async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError>;

    async fn insert(&self, record: T) -> Result<T, DatabaseError>;

    /// Replace the stored row with the same id. `NotFound` when absent.
    async fn update(&self, record: T) -> Result<T, DatabaseError>;

    /// Returns the number of rows removed.
    async fn delete_where(&self, filter_data: FilterData) -> Result<u64, DatabaseError>;

    async fn select_one(&self, mut filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        filter_data.limit = Some(1);
        Ok(self.select_any(filter_data).await?.into_iter().next())
    }

    async fn select_404(&self, filter_data: FilterData) -> Result<T, DatabaseError> {
        self.select_one(filter_data)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record not found", T::TABLE)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.select_one(FilterData::where_(json!({ "id": id }))).await
    }

    async fn select_ids(&self, ids: &[Uuid]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.select_any(FilterData::where_(json!({ "id": { "$in": ids } }))).await
    }

    async fn exists(&self, filter_data: FilterData) -> Result<bool, DatabaseError> {
        Ok(self.count(filter_data).await? > 0)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<u64, DatabaseError> {
        self.delete_where(FilterData::where_(json!({ "id": id }))).await
    }
}
