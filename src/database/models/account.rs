use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::record::{date_value, now, opt_ts_value, ts_value, uuid_value, Record};
use crate::filter::types::{col, Column, SqlType};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub user_name: String,
    pub account: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub icon: String,
    pub mobile: String,
    pub email: String,
    pub work_number: String,
    pub hire_date: NaiveDate,
    pub is_change_password: bool,
    pub is_disabled: bool,
    pub is_leave: bool,
    pub is_frozen: bool,
    pub position_id: Uuid,
    pub organization_id: Uuid,
    pub last_login_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields an administrator sets on create and update.
#[derive(Debug, Clone)]
pub struct AccountProfile {
    pub user_name: String,
    pub account: String,
    pub mobile: String,
    pub email: String,
    pub work_number: String,
    pub hire_date: NaiveDate,
    pub position_id: Uuid,
    pub organization_id: Uuid,
}

impl Account {
    /// New account that must change `password_hash` before first login.
    pub fn new(profile: AccountProfile, password_hash: String) -> Self {
        let now = now();
        let mut account = Self {
            id: Uuid::new_v4(),
            user_name: String::new(),
            account: String::new(),
            password_hash,
            icon: String::new(),
            mobile: String::new(),
            email: String::new(),
            work_number: String::new(),
            hire_date: profile.hire_date,
            is_change_password: true,
            is_disabled: false,
            is_leave: false,
            is_frozen: false,
            position_id: profile.position_id,
            organization_id: profile.organization_id,
            last_login_time: None,
            created_at: now,
            updated_at: now,
        };
        account.apply(profile);
        account
    }

    pub fn apply(&mut self, profile: AccountProfile) {
        self.user_name = profile.user_name;
        self.account = profile.account;
        self.mobile = profile.mobile;
        self.email = profile.email;
        self.work_number = profile.work_number;
        self.hire_date = profile.hire_date;
        self.position_id = profile.position_id;
        self.organization_id = profile.organization_id;
    }
}

impl Record for Account {
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("user_name", SqlType::Text),
        col("account", SqlType::Text),
        col("password_hash", SqlType::Text),
        col("icon", SqlType::Text),
        col("mobile", SqlType::Text),
        col("email", SqlType::Text),
        col("work_number", SqlType::Text),
        col("hire_date", SqlType::Date),
        col("is_change_password", SqlType::Boolean),
        col("is_disabled", SqlType::Boolean),
        col("is_leave", SqlType::Boolean),
        col("is_frozen", SqlType::Boolean),
        col("position_id", SqlType::Uuid),
        col("organization_id", SqlType::Uuid),
        col("last_login_time", SqlType::Timestamp),
        col("created_at", SqlType::Timestamp),
        col("updated_at", SqlType::Timestamp),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["account"], &["mobile"], &["email"], &["work_number"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            json!(self.user_name),
            json!(self.account),
            json!(self.password_hash),
            json!(self.icon),
            json!(self.mobile),
            json!(self.email),
            json!(self.work_number),
            date_value(&self.hire_date),
            json!(self.is_change_password),
            json!(self.is_disabled),
            json!(self.is_leave),
            json!(self.is_frozen),
            uuid_value(self.position_id),
            uuid_value(self.organization_id),
            opt_ts_value(self.last_login_time.as_ref()),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
