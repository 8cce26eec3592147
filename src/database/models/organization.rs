use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::record::{now, opt_uuid_value, ts_value, uuid_value, Record};
use crate::filter::types::{col, Column, SqlType};
use crate::hierarchy::{HierarchyKind, Node};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Unplaced organization; the tree service assigns its level.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id,
            level: 0,
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Organization {
    const TABLE: &'static str = "organizations";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("name", SqlType::Text),
        col("parent_id", SqlType::Uuid),
        col("level", SqlType::Integer),
        col("description", SqlType::Text),
        col("created_at", SqlType::Timestamp),
        col("updated_at", SqlType::Timestamp),
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            json!(self.name),
            opt_uuid_value(self.parent_id),
            json!(self.level),
            json!(self.description),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Node for Organization {
    const KIND: HierarchyKind = HierarchyKind::Organization;

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    fn level(&self) -> i32 {
        self.level
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn place(&mut self, parent_id: Option<Uuid>, level: i32) {
        self.parent_id = parent_id;
        self.level = level;
    }
}
