use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde_json::json;

use crate::auth::JwtKeys;
use crate::config::SecurityConfig;
use crate::database::models::{Account, Organization, Position};
use crate::database::{Table, Tables};
use crate::filter::FilterData;
use crate::services::account::AccountInput;
use crate::services::{AccountService, MenuService, OrganizationService, PermissionService, PositionService, RoleService};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Base64 form a client sends passwords in.
pub fn encode(plain: &str) -> String {
    STANDARD.encode(plain)
}

pub fn test_keys() -> JwtKeys {
    let security = SecurityConfig {
        cors_origins: vec![],
        jwt_secret: "unit-test-secret".to_string(),
        jwt_issuer: "upms-test".to_string(),
        access_token_minutes: 15,
        refresh_token_hours: 24,
        bcrypt_cost: 4,
    };
    match JwtKeys::from_config(&security) {
        Ok(keys) => keys,
        Err(e) => panic!("test keys: {}", e),
    }
}

/// Every service wired over fresh in-memory tables.
pub struct TestContext {
    pub tables: Tables,
    pub organizations: OrganizationService,
    pub menus: MenuService,
    pub positions: PositionService,
    pub accounts: AccountService,
    pub roles: RoleService,
    pub permissions: PermissionService,
}

impl TestContext {
    pub fn new() -> Self {
        let tables = Tables::memory();
        Self {
            organizations: OrganizationService::new(&tables),
            menus: MenuService::new(&tables),
            positions: PositionService::new(&tables),
            accounts: AccountService::new(&tables, Arc::new(test_keys()), 4),
            roles: RoleService::new(&tables),
            permissions: PermissionService::new(&tables),
            tables,
        }
    }

    /// The `Acme/Engineering` organization and its `Engineer` position,
    /// created on first use.
    pub async fn placement(&self) -> (Organization, Position) {
        let existing = self
            .tables
            .organizations
            .select_one(FilterData::where_(json!({ "name": "Engineering" })))
            .await
            .unwrap();
        if let Some(org) = existing {
            let position = self
                .tables
                .positions
                .select_one(FilterData::where_(json!({ "organization_id": org.id })))
                .await
                .unwrap()
                .unwrap();
            return (org, position);
        }

        let root = self
            .tables
            .organizations
            .insert(Organization { level: 1, ..Organization::new("Acme", "", None) })
            .await
            .unwrap();
        let org = self
            .tables
            .organizations
            .insert(Organization { level: 2, ..Organization::new("Engineering", "", Some(root.id)) })
            .await
            .unwrap();
        let position = self.tables.positions.insert(Position::new("Engineer", org.id)).await.unwrap();
        (org, position)
    }

    /// Valid create input with unique contact fields.
    pub async fn account_input(&self, login: &str) -> AccountInput {
        let (org, position) = self.placement().await;
        let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        AccountInput {
            user_name: login.to_string(),
            account: login.to_string(),
            mobile: format!("138{:08}", n),
            email: format!("{}{}@example.com", login, n),
            work_number: format!("W{:06}", n),
            hire_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            position_id: position.id,
            organization_id: org.id,
            is_disabled: None,
            is_leave: None,
        }
    }

    pub async fn seed_account(&self, login: &str) -> Account {
        let input = self.account_input(login).await;
        self.accounts.create(input).await.unwrap().account
    }
}
