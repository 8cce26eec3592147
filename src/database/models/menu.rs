use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::record::{now, opt_uuid_value, ts_value, uuid_value, Record};
use crate::filter::types::{col, Column, SqlType};
use crate::hierarchy::{HierarchyKind, Node};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub path: String,
    pub name: String,
    pub component: String,
    pub redirect: String,
    pub title: String,
    pub icon: String,
    pub order_no: i32,
    pub expanded: bool,
    pub hidden: bool,
    pub hidden_breadcrumb: bool,
    pub single: bool,
    pub frame_src: String,
    pub frame_blank: bool,
    pub keep_alive: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-settable menu attributes, shared by create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuAttributes {
    pub path: String,
    pub name: String,
    pub component: String,
    pub redirect: String,
    pub title: String,
    pub icon: String,
    pub order_no: i32,
    pub expanded: bool,
    pub hidden: bool,
    pub hidden_breadcrumb: bool,
    pub single: bool,
    pub frame_src: String,
    pub frame_blank: bool,
    pub keep_alive: Option<bool>,
}

impl Menu {
    pub fn new(attrs: MenuAttributes, parent_id: Option<Uuid>) -> Self {
        let now = now();
        let mut menu = Self {
            id: Uuid::new_v4(),
            parent_id,
            level: 0,
            path: String::new(),
            name: String::new(),
            component: String::new(),
            redirect: String::new(),
            title: String::new(),
            icon: String::new(),
            order_no: 0,
            expanded: false,
            hidden: false,
            hidden_breadcrumb: false,
            single: false,
            frame_src: String::new(),
            frame_blank: false,
            keep_alive: true,
            created_at: now,
            updated_at: now,
        };
        menu.apply(attrs);
        menu
    }

    pub fn apply(&mut self, attrs: MenuAttributes) {
        self.path = attrs.path;
        self.name = attrs.name;
        self.component = attrs.component;
        self.redirect = attrs.redirect;
        self.title = attrs.title;
        self.icon = attrs.icon;
        self.order_no = attrs.order_no;
        self.expanded = attrs.expanded;
        self.hidden = attrs.hidden;
        self.hidden_breadcrumb = attrs.hidden_breadcrumb;
        self.single = attrs.single;
        self.frame_src = attrs.frame_src;
        self.frame_blank = attrs.frame_blank;
        self.keep_alive = attrs.keep_alive.unwrap_or(true);
    }
}

impl Record for Menu {
    const TABLE: &'static str = "menus";
    const COLUMNS: &'static [Column] = &[
        col("id", SqlType::Uuid),
        col("parent_id", SqlType::Uuid),
        col("level", SqlType::Integer),
        col("path", SqlType::Text),
        col("name", SqlType::Text),
        col("component", SqlType::Text),
        col("redirect", SqlType::Text),
        col("title", SqlType::Text),
        col("icon", SqlType::Text),
        col("order_no", SqlType::Integer),
        col("expanded", SqlType::Boolean),
        col("hidden", SqlType::Boolean),
        col("hidden_breadcrumb", SqlType::Boolean),
        col("single", SqlType::Boolean),
        col("frame_src", SqlType::Text),
        col("frame_blank", SqlType::Boolean),
        col("keep_alive", SqlType::Boolean),
        col("created_at", SqlType::Timestamp),
        col("updated_at", SqlType::Timestamp),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["name"]];
    const DEFAULT_ORDER: &'static str = "order_no";

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            opt_uuid_value(self.parent_id),
            json!(self.level),
            json!(self.path),
            json!(self.name),
            json!(self.component),
            json!(self.redirect),
            json!(self.title),
            json!(self.icon),
            json!(self.order_no),
            json!(self.expanded),
            json!(self.hidden),
            json!(self.hidden_breadcrumb),
            json!(self.single),
            json!(self.frame_src),
            json!(self.frame_blank),
            json!(self.keep_alive),
            ts_value(&self.created_at),
            ts_value(&self.updated_at),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Node for Menu {
    const KIND: HierarchyKind = HierarchyKind::Menu;

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
