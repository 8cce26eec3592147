use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::record::{now, ts_value, uuid_value, Record};
use crate::filter::types::{col, Column, SqlType};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Role {
    const TABLE: &'static str = "roles";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("name", SqlType::Text),
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
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Account to role binding.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountRole {
    pub id: Uuid,
    pub account_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRole {
    pub fn new(account_id: Uuid, role_id: Uuid) -> Self {
        let now = now();
        Self { id: Uuid::new_v4(), account_id, role_id, created_at: now, updated_at: now }
    }
}

impl Record for AccountRole {
    const TABLE: &'static str = "account_roles";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("account_id", SqlType::Uuid),
        col("role_id", SqlType::Uuid),
        col("created_at", SqlType::Timestamp),
        col("updated_at", SqlType::Timestamp),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["account_id", "role_id"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            uuid_value(self.account_id),
            uuid_value(self.role_id),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Role to menu binding.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoleMenu {
    pub id: Uuid,
    pub role_id: Uuid,
    pub menu_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleMenu {
    pub fn new(role_id: Uuid, menu_id: Uuid) -> Self {
        let now = now();
        Self { id: Uuid::new_v4(), role_id, menu_id, created_at: now, updated_at: now }
    }
}

impl Record for RoleMenu {
    const TABLE: &'static str = "role_menus";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("role_id", SqlType::Uuid),
        col("menu_id", SqlType::Uuid),
        col("created_at", SqlType::Timestamp),
        col("updated_at", SqlType::Timestamp),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["role_id", "menu_id"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            uuid_value(self.role_id),
            uuid_value(self.menu_id),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
