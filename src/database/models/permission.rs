use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::record::{now, ts_value, uuid_value, Record};
use crate::filter::types::{col, Column, SqlType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Read = 0,
    Write = 1,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub role_id: Uuid,
    pub resource: String,
    pub action: PermissionAction,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(name: impl Into<String>, role_id: Uuid, resource: impl Into<String>, action: PermissionAction) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role_id,
            resource: resource.into(),
            action,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Permission {
    const TABLE: &'static str = "permissions";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("name", SqlType::Text),
        col("role_id", SqlType::Uuid),
        col("resource", SqlType::Text),
        col("action", SqlType::SmallInt),
        col("created_at", SqlType::Timestamp),
        col("updated_at", SqlType::Timestamp),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["name"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            json!(self.name),
            uuid_value(self.role_id),
            json!(self.resource),
            json!(self.action as i16),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
