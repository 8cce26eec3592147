use std::sync::Arc;

use sqlx::PgPool;

use crate::database::memory::MemoryTable;
use crate::database::models::{Account, AccountRole, Menu, Organization, Permission, Position, Role, RoleMenu};
use crate::database::repository::Repository;
use crate::database::table::Table;

/// One handle per table, shared by every service.
#[derive(Clone)]
pub struct Tables {
    pub organizations: Arc<dyn Table<Organization>>,
    pub menus: Arc<dyn Table<Menu>>,
    pub positions: Arc<dyn Table<Position>>,
    pub accounts: Arc<dyn Table<Account>>,
    pub roles: Arc<dyn Table<Role>>,
    pub account_roles: Arc<dyn Table<AccountRole>>,
    pub role_menus: Arc<dyn Table<RoleMenu>>,
    pub permissions: Arc<dyn Table<Permission>>,
}

impl Tables {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            organizations: Arc::new(Repository::new(pool.clone())),
            menus: Arc::new(Repository::new(pool.clone())),
            positions: Arc::new(Repository::new(pool.clone())),
            accounts: Arc::new(Repository::new(pool.clone())),
            roles: Arc::new(Repository::new(pool.clone())),
            account_roles: Arc::new(Repository::new(pool.clone())),
            role_menus: Arc::new(Repository::new(pool.clone())),
            permissions: Arc::new(Repository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self {
            organizations: Arc::new(MemoryTable::new()),
            menus: Arc::new(MemoryTable::new()),
            positions: Arc::new(MemoryTable::new()),
            accounts: Arc::new(MemoryTable::new()),
            roles: Arc::new(MemoryTable::new()),
            account_roles: Arc::new(MemoryTable::new()),
            role_menus: Arc::new(MemoryTable::new()),
            permissions: Arc::new(MemoryTable::new()),
        }
    }
}
