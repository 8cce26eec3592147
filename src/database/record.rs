use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::filter::Column;

/// A row type persisted in one table.
///
/// `COLUMNS` lists every persisted column with `id` first; `values()` returns
/// the matching values in the same order. Both storage backends are driven
/// from these two.
pub trait Record: Clone + Send + Sync + Unpin + 'static + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;
    const COLUMNS: &'static [Column];
    /// Column groups whose combined values must be unique.
    const UNIQUE: &'static [&'static [&'static str]] = &[];
    const DEFAULT_ORDER: &'static str = "created_at";

    fn id(&self) -> Uuid;

    fn values(&self) -> Vec<Value>;

    fn touch(&mut self, now: DateTime<Utc>);

    /// The record as a column-keyed map, used by the in-memory filter.
    fn row(&self) -> Map<String, Value> {
        Self::COLUMNS
            .iter()
            .zip(self.values())
            .map(|(c, v)| (c.name.to_string(), v))
            .collect()
    }
}

pub fn uuid_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}

pub fn opt_uuid_value(id: Option<Uuid>) -> Value {
    id.map(uuid_value).unwrap_or(Value::Null)
}

pub fn ts_value(dt: &DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub fn opt_ts_value(dt: Option<&DateTime<Utc>>) -> Value {
    dt.map(ts_value).unwrap_or(Value::Null)
}

pub fn date_value(d: &NaiveDate) -> Value {
    Value::String(d.format("%Y-%m-%d").to_string())
}

/// Current time truncated to microseconds, the precision Postgres stores.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}
