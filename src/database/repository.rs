use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::database::record::Record;
use crate::database::table::Table;
use crate::filter::FilterData;

/// Postgres-backed [`Table`].
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Record> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T: Record> Table<T> for Repository<T> {
    async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new()?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new()?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    async fn insert(&self, record: T) -> Result<T, DatabaseError> {
        QueryBuilder::<T>::insert(&record, &self.pool).await
    }

    async fn update(&self, record: T) -> Result<T, DatabaseError> {
        QueryBuilder::<T>::update(&record, &self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, record.id())))
    }

    async fn delete_where(&self, filter_data: FilterData) -> Result<u64, DatabaseError> {
        QueryBuilder::<T>::new()?
            .filter(filter_data)?
            .delete(&self.pool)
            .await
    }
}
