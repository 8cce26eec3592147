use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::ServiceError;
use super::validate::FieldErrors;
use crate::database::models::{Account, Organization, Position};
use crate::database::record::now;
use crate::database::{Table, Tables};
use crate::filter::{escape_like, FilterData};
use crate::pagination::{paginate, Pagination, QueryResponse};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    pub name: String,
    pub organization_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionRename {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionQuery {
    pub organization_id: Option<Uuid>,
    pub name: Option<String>,
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    FieldErrors::new().required("name", name).max_len("name", name, 64).finish()
}

pub struct PositionService {
    positions: Arc<dyn Table<Position>>,
    organizations: Arc<dyn Table<Organization>>,
    accounts: Arc<dyn Table<Account>>,
}

impl PositionService {
    pub fn new(tables: &Tables) -> Self {
        Self {
            positions: tables.positions.clone(),
            organizations: tables.organizations.clone(),
            accounts: tables.accounts.clone(),
        }
    }

    pub async fn list(&self, query: &PositionQuery, page: &Pagination) -> Result<QueryResponse<Position>, ServiceError> {
        let mut conditions = Map::new();
        if let Some(org) = query.organization_id {
            conditions.insert("organization_id".into(), json!(org));
        }
        if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            conditions.insert("name".into(), json!({ "$like": format!("%{}%", escape_like(name)) }));
        }
        Ok(paginate(self.positions.as_ref(), Value::Object(conditions), page, "created_at").await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Position, ServiceError> {
        self.positions
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("position {} not found", id)))
    }

    pub async fn create(&self, input: PositionInput) -> Result<Position, ServiceError> {
        validate_name(&input.name)?;
        if self.organizations.find_by_id(input.organization_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("organization {} not found", input.organization_id)));
        }
        let position = self.positions.insert(Position::new(input.name.trim(), input.organization_id)).await?;
        info!("Created position {} '{}' in {}", position.id, position.name, position.organization_id);
        Ok(position)
    }

    pub async fn rename(&self, id: Uuid, input: PositionRename) -> Result<Position, ServiceError> {
        validate_name(&input.name)?;
        let mut position = self.get(id).await?;
        position.name = input.name.trim().to_string();
        position.updated_at = now();
        Ok(self.positions.update(position).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let holders = self.accounts.count(FilterData::where_(json!({ "position_id": id }))).await?;
        if holders > 0 {
            warn!("Refusing to delete position {} held by {} accounts", id, holders);
            return Err(ServiceError::HasDependents(format!("position {} is held by {} accounts", id, holders)));
        }
        if self.positions.delete_by_id(id).await? == 0 {
            return Err(ServiceError::NotFound(format!("position {} not found", id)));
        }
        info!("Deleted position {}", id);
        Ok(())
    }
}
