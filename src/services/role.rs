use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::ServiceError;
use super::validate::{is_alphanumeric, FieldErrors};
use crate::database::models::{Account, AccountRole, Menu, Permission, Role, RoleMenu};
use crate::database::record::now;
use crate::database::{Table, Tables};
use crate::filter::{escape_like, FilterData};
use crate::hierarchy::{build_forest, resolve_ancestor_path, TreeNode};
use crate::pagination::{paginate, Pagination, QueryResponse};

#[derive(Debug, Clone, Deserialize)]
pub struct RoleInput {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleQuery {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountIds {
    pub account_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuIds {
    pub menu_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAccounts {
    pub role_id: Uuid,
    pub account_ids: Vec<Uuid>,
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    FieldErrors::new()
        .required("name", name)
        .max_len("name", name, 32)
        .check("name", is_alphanumeric(name), "must contain only letters and digits")
        .finish()
}

fn missing_ids(wanted: &[Uuid], found: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let found: HashSet<Uuid> = found.into_iter().collect();
    let mut missing: Vec<Uuid> = wanted.iter().copied().filter(|id| !found.contains(id)).collect();
    missing.dedup();
    missing
}

pub struct RoleService {
    roles: Arc<dyn Table<Role>>,
    accounts: Arc<dyn Table<Account>>,
    menus: Arc<dyn Table<Menu>>,
    account_roles: Arc<dyn Table<AccountRole>>,
    role_menus: Arc<dyn Table<RoleMenu>>,
    permissions: Arc<dyn Table<Permission>>,
}

impl RoleService {
    pub fn new(tables: &Tables) -> Self {
        Self {
            roles: tables.roles.clone(),
            accounts: tables.accounts.clone(),
            menus: tables.menus.clone(),
            account_roles: tables.account_roles.clone(),
            role_menus: tables.role_menus.clone(),
            permissions: tables.permissions.clone(),
        }
    }

    pub async fn list(&self, query: &RoleQuery, page: &Pagination) -> Result<QueryResponse<Role>, ServiceError> {
        let where_clause = match query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => json!({ "name": { "$like": format!("%{}%", escape_like(name)) } }),
            None => json!({}),
        };
        Ok(paginate(self.roles.as_ref(), where_clause, page, "created_at").await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Role, ServiceError> {
        self.roles
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("role {} not found", id)))
    }

    pub async fn create(&self, input: RoleInput) -> Result<Role, ServiceError> {
        validate_name(&input.name)?;
        let role = self.roles.insert(Role::new(input.name)).await?;
        info!("Created role {} '{}'", role.id, role.name);
        Ok(role)
    }

    pub async fn rename(&self, id: Uuid, input: RoleInput) -> Result<Role, ServiceError> {
        validate_name(&input.name)?;
        let mut role = self.get(id).await?;
        role.name = input.name;
        role.updated_at = now();
        Ok(self.roles.update(role).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let by_role = || FilterData::where_(json!({ "role_id": id }));

        let bound = self.account_roles.count(by_role()).await?;
        if bound > 0 {
            warn!("Refusing to delete role {} bound to {} accounts", id, bound);
            return Err(ServiceError::HasDependents(format!("role {} is bound to {} accounts", id, bound)));
        }
        let permissions = self.permissions.count(by_role()).await?;
        if permissions > 0 {
            warn!("Refusing to delete role {} referenced by {} permissions", id, permissions);
            return Err(ServiceError::HasDependents(format!("role {} is referenced by {} permissions", id, permissions)));
        }

        if self.roles.delete_by_id(id).await? == 0 {
            return Err(ServiceError::NotFound(format!("role {} not found", id)));
        }
        let unbound = self.role_menus.delete_where(by_role()).await?;
        info!("Deleted role {} and {} menu bindings", id, unbound);
        Ok(())
    }

    pub async fn bound_accounts(&self, role_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let bindings = self
            .account_roles
            .select_any(FilterData::where_(json!({ "role_id": role_id })))
            .await?;
        Ok(bindings.into_iter().map(|b| b.account_id).collect())
    }

    /// Bind every listed account. Existing bindings are left alone.
    pub async fn bind_accounts(&self, role_id: Uuid, input: AccountIds) -> Result<RoleAccounts, ServiceError> {
        self.get(role_id).await?;
        let accounts = self.accounts.select_ids(&input.account_ids).await?;
        let missing = missing_ids(&input.account_ids, accounts.iter().map(|a| a.id));
        if !missing.is_empty() {
            return Err(ServiceError::NotFound(format!("accounts not found: {:?}", missing)));
        }

        let mut bound: HashSet<Uuid> = self.bound_accounts(role_id).await?.into_iter().collect();
        for account in accounts {
            if bound.insert(account.id) {
                self.account_roles.insert(AccountRole::new(account.id, role_id)).await?;
                info!("Bound account {} to role {}", account.id, role_id);
            }
        }

        Ok(RoleAccounts { role_id, account_ids: self.bound_accounts(role_id).await? })
    }

    pub async fn unbind_accounts(&self, role_id: Uuid, input: AccountIds) -> Result<RoleAccounts, ServiceError> {
        self.get(role_id).await?;
        if !input.account_ids.is_empty() {
            let removed = self
                .account_roles
                .delete_where(FilterData::where_(json!({
                    "role_id": role_id,
                    "account_id": { "$in": input.account_ids },
                })))
                .await?;
            info!("Unbound {} accounts from role {}", removed, role_id);
        }
        Ok(RoleAccounts { role_id, account_ids: self.bound_accounts(role_id).await? })
    }

    /// Replace the role's menu bindings and return the resulting forest.
    pub async fn set_menus(&self, role_id: Uuid, input: MenuIds) -> Result<Vec<TreeNode<Menu>>, ServiceError> {
        self.get(role_id).await?;
        let mut wanted = input.menu_ids;
        wanted.sort();
        wanted.dedup();

        let menus = self.menus.select_ids(&wanted).await?;
        let missing = missing_ids(&wanted, menus.iter().map(|m| m.id));
        if !missing.is_empty() {
            return Err(ServiceError::NotFound(format!("menus not found: {:?}", missing)));
        }

        self.role_menus.delete_where(FilterData::where_(json!({ "role_id": role_id }))).await?;
        for menu_id in &wanted {
            self.role_menus.insert(RoleMenu::new(role_id, *menu_id)).await?;
        }
        info!("Role {} now bound to {} menus", role_id, wanted.len());

        self.menus(role_id).await
    }

    /// Bound menus plus their ancestors, as a forest in menu order.
    pub async fn menus(&self, role_id: Uuid) -> Result<Vec<TreeNode<Menu>>, ServiceError> {
        self.get(role_id).await?;
        let bindings = self
            .role_menus
            .select_any(FilterData::where_(json!({ "role_id": role_id })))
            .await?;
        let ids: Vec<Uuid> = bindings.iter().map(|b| b.menu_id).collect();

        let mut visible: HashMap<Uuid, Menu> = HashMap::new();
        for menu in self.menus.select_ids(&ids).await? {
            if visible.contains_key(&menu.id) {
                continue;
            }
            for node in resolve_ancestor_path(self.menus.as_ref(), menu).await? {
                visible.entry(node.id).or_insert(node);
            }
        }

        let mut menus: Vec<Menu> = visible.into_values().collect();
        menus.sort_by(|a, b| a.order_no.cmp(&b.order_no).then_with(|| a.name.cmp(&b.name)));
        Ok(build_forest(menus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::MenuAttributes;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn name_must_be_alphanumeric() {
        let ctx = TestContext::new();
        let err = ctx.roles.create(RoleInput { name: "ops team".into() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed { .. }));
        ctx.roles.create(RoleInput { name: "ops2".into() }).await.unwrap();
    }

    #[tokio::test]
    async fn binding_is_idempotent_and_blocks_delete() {
        let ctx = TestContext::new();
        let account = ctx.seed_account("alice").await;
        let role = ctx.roles.create(RoleInput { name: "admin".into() }).await.unwrap();

        let ids = AccountIds { account_ids: vec![account.id] };
        ctx.roles.bind_accounts(role.id, ids.clone()).await.unwrap();
        let bound = ctx.roles.bind_accounts(role.id, ids.clone()).await.unwrap();
        assert_eq!(bound.account_ids, vec![account.id]);

        assert!(matches!(ctx.roles.delete(role.id).await.unwrap_err(), ServiceError::HasDependents(_)));

        let unbound = ctx.roles.unbind_accounts(role.id, ids).await.unwrap();
        assert!(unbound.account_ids.is_empty());
        ctx.roles.delete(role.id).await.unwrap();
    }

    #[tokio::test]
    async fn binding_unknown_account_is_not_found() {
        let ctx = TestContext::new();
        let role = ctx.roles.create(RoleInput { name: "admin".into() }).await.unwrap();
        let err = ctx
            .roles
            .bind_accounts(role.id, AccountIds { account_ids: vec![Uuid::new_v4()] })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn bound_menus_come_back_with_ancestors() {
        let ctx = TestContext::new();
        let attrs = |name: &str, order_no: i32| MenuAttributes {
            path: format!("/{}", name),
            name: name.to_string(),
            title: name.to_string(),
            order_no,
            ..Default::default()
        };
        let system = ctx.tables.menus.insert(Menu { level: 1, ..Menu::new(attrs("system", 2), None) }).await.unwrap();
        let users = ctx.tables.menus.insert(Menu { level: 2, ..Menu::new(attrs("users", 1), Some(system.id)) }).await.unwrap();
        let home = ctx.tables.menus.insert(Menu { level: 1, ..Menu::new(attrs("home", 1), None) }).await.unwrap();

        let role = ctx.roles.create(RoleInput { name: "viewer".into() }).await.unwrap();
        let forest = ctx
            .roles
            .set_menus(role.id, MenuIds { menu_ids: vec![users.id, home.id] })
            .await
            .unwrap();

        let roots: Vec<_> = forest.iter().map(|t| t.node.name.as_str()).collect();
        assert_eq!(roots, vec!["home", "system"]);
        assert_eq!(forest[1].children[0].node.id, users.id);

        ctx.roles.delete(role.id).await.unwrap();
        assert_eq!(ctx.tables.role_menus.count(FilterData::default()).await.unwrap(), 0);
    }
}
