use serde_json::Value;
use sqlx::{self, postgres::PgArguments, FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::record::Record;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Record> QueryBuilder<T> {
    pub fn new() -> Result<Self, DatabaseError> {
        Ok(Self {
            filter: Filter::new(T::TABLE, T::COLUMNS)?,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        self.filter.default_order(T::DEFAULT_ORDER);
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        Self::debug(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = self.filter.to_count_sql()?;
        Self::debug(&sql_result);
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    pub async fn delete(self, pool: &PgPool) -> Result<u64, DatabaseError> {
        let sql_result = self.filter.to_delete_sql()?;
        Self::debug(&sql_result);
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        Ok(q.execute(pool).await?.rows_affected())
    }

    pub async fn insert(record: &T, pool: &PgPool) -> Result<T, DatabaseError> {
        let sql_result = insert_sql::<T>(record);
        Self::debug(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_one(pool).await?)
    }

    pub async fn update(record: &T, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = update_sql::<T>(record);
        Self::debug(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    fn debug(sql_result: &SqlResult) {
        if crate::config::CONFIG.filter.debug_logging {
            tracing::debug!("SQL: {} ({} params)", sql_result.query, sql_result.params.len());
        }
    }
}

fn insert_sql<T: Record>(record: &T) -> SqlResult {
    let names: Vec<String> = T::COLUMNS.iter().map(|c| format!("\"{}\"", c.name)).collect();
    let placeholders: Vec<String> = T::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| format!("${}::{}", i + 1, c.sql_type.cast()))
        .collect();
    SqlResult {
        query: format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            T::TABLE,
            names.join(", "),
            placeholders.join(", ")
        ),
        params: record.values(),
    }
}

// `id` is the first column and doubles as the WHERE parameter.
fn update_sql<T: Record>(record: &T) -> SqlResult {
    let assignments: Vec<String> = T::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| format!("\"{}\" = ${}::{}", c.name, i + 1, c.sql_type.cast()))
        .collect();
    SqlResult {
        query: format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = $1::uuid RETURNING *",
            T::TABLE,
            assignments.join(", ")
        ),
        params: record.values(),
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;

    #[test]
    fn insert_sql_casts_every_column() {
        let role = Role::new("admin");
        let sql = insert_sql(&role);
        assert_eq!(
            sql.query,
            "INSERT INTO \"roles\" (\"id\", \"name\", \"created_at\", \"updated_at\") \
             VALUES ($1::uuid, $2::text, $3::timestamptz, $4::timestamptz) RETURNING *"
        );
        assert_eq!(sql.params.len(), 4);
    }

    #[test]
    fn update_sql_keys_on_first_parameter() {
        let role = Role::new("admin");
        let sql = update_sql(&role);
        assert_eq!(
            sql.query,
            "UPDATE \"roles\" SET \"name\" = $2::text, \"created_at\" = $3::timestamptz, \
             \"updated_at\" = $4::timestamptz WHERE \"id\" = $1::uuid RETURNING *"
        );
    }
}
