use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use super::error::ServiceError;
use super::validate::FieldErrors;
use crate::database::models::{Permission, PermissionAction, Role};
use crate::database::record::now;
use crate::database::{Table, Tables};
use crate::filter::escape_like;
use crate::pagination::{paginate, Pagination, QueryResponse};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionInput {
    pub name: String,
    pub role_id: Uuid,
    pub resource: String,
    pub action: PermissionAction,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionQuery {
    pub name: Option<String>,
    pub role_id: Option<Uuid>,
}

pub struct PermissionService {
    permissions: Arc<dyn Table<Permission>>,
    roles: Arc<dyn Table<Role>>,
}

impl PermissionService {
    pub fn new(tables: &Tables) -> Self {
        Self { permissions: tables.permissions.clone(), roles: tables.roles.clone() }
    }

    async fn check(&self, input: &PermissionInput) -> Result<(), ServiceError> {
        FieldErrors::new()
            .required("name", &input.name)
            .max_len("name", &input.name, 32)
            .required("resource", &input.resource)
            .max_len("resource", &input.resource, 255)
            .finish()?;
        if self.roles.find_by_id(input.role_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("role {} not found", input.role_id)));
        }
        Ok(())
    }

    pub async fn list(&self, query: &PermissionQuery, page: &Pagination) -> Result<QueryResponse<Permission>, ServiceError> {
        let mut conditions = Map::new();
        if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            conditions.insert("name".into(), json!({ "$like": format!("%{}%", escape_like(name)) }));
        }
        if let Some(role_id) = query.role_id {
            conditions.insert("role_id".into(), json!(role_id));
        }
        Ok(paginate(self.permissions.as_ref(), Value::Object(conditions), page, "created_at").await?)
    }

    pub async fn create(&self, input: PermissionInput) -> Result<Permission, ServiceError> {
        self.check(&input).await?;
        let permission = self
            .permissions
            .insert(Permission::new(input.name, input.role_id, input.resource, input.action))
            .await?;
        info!("Created permission {} '{}' for role {}", permission.id, permission.name, permission.role_id);
        Ok(permission)
    }

    pub async fn update(&self, id: Uuid, input: PermissionInput) -> Result<Permission, ServiceError> {
        self.check(&input).await?;
        let mut permission = self
            .permissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("permission {} not found", id)))?;
        permission.name = input.name;
        permission.role_id = input.role_id;
        permission.resource = input.resource;
        permission.action = input.action;
        permission.updated_at = now();
        Ok(self.permissions.update(permission).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.permissions.delete_by_id(id).await? == 0 {
            return Err(ServiceError::NotFound(format!("permission {} not found", id)));
        }
        info!("Deleted permission {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn input(name: &str, role_id: Uuid) -> PermissionInput {
        PermissionInput {
            name: name.to_string(),
            role_id,
            resource: "/api/v1/users/accounts".to_string(),
            action: PermissionAction::Read,
        }
    }

    #[tokio::test]
    async fn role_must_exist() {
        let ctx = TestContext::new();
        let err = ctx.permissions.create(input("read-accounts", Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_by_role_and_delete() {
        let ctx = TestContext::new();
        let role = ctx.tables.roles.insert(Role::new("auditor")).await.unwrap();
        let other = ctx.tables.roles.insert(Role::new("writer")).await.unwrap();
        let p = ctx.permissions.create(input("read-accounts", role.id)).await.unwrap();
        ctx.permissions.create(input("read-menus", other.id)).await.unwrap();

        let query = PermissionQuery { name: None, role_id: Some(role.id) };
        let found = ctx.permissions.list(&query, &Pagination::default()).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.data[0].id, p.id);

        ctx.permissions.delete(p.id).await.unwrap();
        assert!(matches!(ctx.permissions.delete(p.id).await.unwrap_err(), ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn action_can_be_switched() {
        let ctx = TestContext::new();
        let role = ctx.tables.roles.insert(Role::new("auditor")).await.unwrap();
        let p = ctx.permissions.create(input("accounts", role.id)).await.unwrap();
        let mut change = input("accounts", role.id);
        change.action = PermissionAction::Write;
        let updated = ctx.permissions.update(p.id, change).await.unwrap();
        assert_eq!(updated.action, PermissionAction::Write);
    }
}
