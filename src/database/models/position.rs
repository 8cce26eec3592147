use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::record::{now, ts_value, uuid_value, Record};
use crate::filter::types::{col, Column, SqlType};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    pub fn new(name: impl Into<String>, organization_id: Uuid) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            organization_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Position {
    const TABLE: &'static str = "positions";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("name", SqlType::Text),
        col("organization_id", SqlType::Uuid),
        col("created_at", SqlType::Timestamp),
        col("updated_at", SqlType::Timestamp),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["organization_id", "name"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            json!(self.name),
            uuid_value(self.organization_id),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
