use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::ServiceError;
use super::validate::{is_email, FieldErrors};
use crate::auth::password;
use crate::auth::{JwtKeys, TokenKind, TokenPair};
use crate::database::models::{Account, AccountProfile};
use crate::database::record::now;
use crate::database::{Table, Tables};
use crate::filter::{escape_like, FilterData};
use crate::hierarchy::{breadcrumb, resolve_ancestor_path};
use crate::pagination::{paginate, Pagination, QueryResponse};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
    pub user_name: String,
    pub account: String,
    pub mobile: String,
    pub email: String,
    pub work_number: String,
    pub hire_date: NaiveDate,
    pub position_id: Uuid,
    pub organization_id: Uuid,
    #[serde(default)]
    pub is_disabled: Option<bool>,
    #[serde(default)]
    pub is_leave: Option<bool>,
}

impl AccountInput {
    fn validate(&self) -> Result<(), ServiceError> {
        FieldErrors::new()
            .required("userName", &self.user_name)
            .max_len("userName", &self.user_name, 32)
            .required("account", &self.account)
            .max_len("account", &self.account, 32)
            .required("mobile", &self.mobile)
            .max_len("mobile", &self.mobile, 11)
            .check("mobile", self.mobile.chars().all(|c| c.is_ascii_digit()), "must contain only digits")
            .required("email", &self.email)
            .max_len("email", &self.email, 36)
            .check("email", is_email(&self.email), "must be a valid email address")
            .required("workNumber", &self.work_number)
            .max_len("workNumber", &self.work_number, 24)
            .finish()
    }

    fn profile(&self) -> AccountProfile {
        AccountProfile {
            user_name: self.user_name.trim().to_string(),
            account: self.account.trim().to_string(),
            mobile: self.mobile.clone(),
            email: self.email.trim().to_string(),
            work_number: self.work_number.trim().to_string(),
            hire_date: self.hire_date,
            position_id: self.position_id,
            organization_id: self.organization_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    pub user_name: Option<String>,
    pub account: Option<String>,
    pub mobile: Option<String>,
    pub work_number: Option<String>,
    pub email: Option<String>,
    pub is_disabled: Option<bool>,
    pub is_leave: Option<bool>,
    pub position_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
}

impl AccountQuery {
    fn to_where(&self) -> Value {
        let mut conditions = Map::new();
        let substrings = [
            ("user_name", &self.user_name),
            ("account", &self.account),
            ("mobile", &self.mobile),
            ("work_number", &self.work_number),
            ("email", &self.email),
        ];
        for (column, value) in substrings {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                conditions.insert(column.into(), json!({ "$like": format!("%{}%", escape_like(v)) }));
            }
        }
        if let Some(v) = self.is_disabled {
            conditions.insert("is_disabled".into(), json!(v));
        }
        if let Some(v) = self.is_leave {
            conditions.insert("is_leave".into(), json!(v));
        }
        if let Some(v) = self.position_id {
            conditions.insert("position_id".into(), json!(v));
        }
        if let Some(v) = self.organization_id {
            conditions.insert("organization_id".into(), json!(v));
        }
        Value::Object(conditions)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    #[serde(flatten)]
    pub account: Account,
    pub organization_name: String,
    pub organization_tree_name: String,
    pub position_name: String,
    pub roles: Vec<String>,
}

/// A new account and the password it was given. The password is not stored
/// in clear and cannot be read back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreated {
    #[serde(flatten)]
    pub account: Account,
    pub initial_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub account_id: Uuid,
    pub initial_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub account: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub account: Account,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub account: String,
    pub password: String,
    pub new_password: String,
    pub re_new_password: String,
}

fn bad_credentials() -> ServiceError {
    ServiceError::Unauthorized("Invalid account or password".to_string())
}

pub struct AccountService {
    tables: Tables,
    keys: Arc<JwtKeys>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(tables: &Tables, keys: Arc<JwtKeys>, bcrypt_cost: u32) -> Self {
        Self { tables: tables.clone(), keys, bcrypt_cost }
    }

    fn hash(&self, plain: &str) -> Result<String, ServiceError> {
        password::hash(plain, self.bcrypt_cost).map_err(|e| {
            error!("Password hashing failed: {}", e);
            ServiceError::Internal("password hashing failed".to_string())
        })
    }

    async fn check_placement(&self, input: &AccountInput) -> Result<(), ServiceError> {
        if self.tables.organizations.find_by_id(input.organization_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("organization {} not found", input.organization_id)));
        }
        if self.tables.positions.find_by_id(input.position_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("position {} not found", input.position_id)));
        }
        Ok(())
    }

    pub async fn fetch(&self, id: Uuid) -> Result<Account, ServiceError> {
        self.tables
            .accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account {} not found", id)))
    }

    async fn by_login(&self, login: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self
            .tables
            .accounts
            .select_one(FilterData::where_(json!({ "account": login.trim() })))
            .await?)
    }

    pub async fn role_names(&self, account_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let bindings = self
            .tables
            .account_roles
            .select_any(FilterData::where_(json!({ "account_id": account_id })))
            .await?;
        let ids: Vec<Uuid> = bindings.iter().map(|b| b.role_id).collect();
        let mut names: Vec<String> = self.tables.roles.select_ids(&ids).await?.into_iter().map(|r| r.name).collect();
        names.sort();
        Ok(names)
    }

    pub async fn create(&self, input: AccountInput) -> Result<AccountCreated, ServiceError> {
        input.validate()?;
        self.check_placement(&input).await?;

        let initial_password = password::generate();
        let mut account = Account::new(input.profile(), self.hash(&initial_password)?);
        account.is_disabled = input.is_disabled.unwrap_or(false);
        account.is_leave = input.is_leave.unwrap_or(false);

        let account = self.tables.accounts.insert(account).await?;
        info!("Created account {} '{}'", account.id, account.account);
        Ok(AccountCreated { account, initial_password })
    }

    pub async fn get(&self, id: Uuid) -> Result<AccountDetail, ServiceError> {
        let account = self.fetch(id).await?;

        let organization = self
            .tables
            .organizations
            .find_by_id(account.organization_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("organization {} not found", account.organization_id)))?;
        let organization_name = organization.name.clone();
        let path = resolve_ancestor_path(self.tables.organizations.as_ref(), organization).await?;

        let position_name = self
            .tables
            .positions
            .find_by_id(account.position_id)
            .await?
            .map(|p| p.name)
            .unwrap_or_default();

        Ok(AccountDetail {
            roles: self.role_names(account.id).await?,
            organization_name,
            organization_tree_name: breadcrumb(&path),
            position_name,
            account,
        })
    }

    pub async fn list(&self, query: &AccountQuery, page: &Pagination) -> Result<QueryResponse<Account>, ServiceError> {
        Ok(paginate(self.tables.accounts.as_ref(), query.to_where(), page, "created_at").await?)
    }

    pub async fn update(&self, id: Uuid, input: AccountInput) -> Result<Account, ServiceError> {
        input.validate()?;
        self.check_placement(&input).await?;

        let mut account = self.fetch(id).await?;
        account.apply(input.profile());
        if let Some(v) = input.is_disabled {
            account.is_disabled = v;
        }
        if let Some(v) = input.is_leave {
            account.is_leave = v;
        }
        account.updated_at = now();

        let account = self.tables.accounts.update(account).await?;
        info!("Updated account {}", account.id);
        Ok(account)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.tables.accounts.delete_by_id(id).await? == 0 {
            return Err(ServiceError::NotFound(format!("account {} not found", id)));
        }
        let unbound = self
            .tables
            .account_roles
            .delete_where(FilterData::where_(json!({ "account_id": id })))
            .await?;
        info!("Deleted account {} and {} role bindings", id, unbound);
        Ok(())
    }

    fn ensure_active(account: &Account) -> Result<(), ServiceError> {
        if account.is_disabled {
            warn!("Login refused for disabled account {}", account.account);
            return Err(ServiceError::Forbidden("Account is disabled".to_string()));
        }
        if account.is_leave {
            warn!("Login refused for departed account {}", account.account);
            return Err(ServiceError::Forbidden("Account holder has left".to_string()));
        }
        if account.is_frozen {
            warn!("Login refused for frozen account {}", account.account);
            return Err(ServiceError::Forbidden("Account is frozen".to_string()));
        }
        Ok(())
    }

    fn issue(&self, account: &Account, roles: &[String]) -> Result<TokenPair, ServiceError> {
        self.keys.issue_pair(&account.account, account.id, roles).map_err(|e| {
            error!("Token issue failed for {}: {}", account.account, e);
            ServiceError::Internal("unable to issue token".to_string())
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let mut account = self.by_login(&request.account).await?.ok_or_else(bad_credentials)?;
        let plain = password::decode(&request.password).ok_or_else(bad_credentials)?;
        if !password::verify(&plain, &account.password_hash) {
            warn!("Wrong password for account {}", account.account);
            return Err(bad_credentials());
        }
        Self::ensure_active(&account)?;
        if account.is_change_password {
            return Err(ServiceError::PasswordResetRequired(
                "Password must be changed before logging in".to_string(),
            ));
        }

        account.last_login_time = Some(now());
        let account = self.tables.accounts.update(account).await?;

        let roles = self.role_names(account.id).await?;
        let tokens = self.issue(&account, &roles)?;
        info!("Account {} logged in", account.account);
        Ok(LoginResponse { tokens, account })
    }

    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenPair, ServiceError> {
        let claims = self
            .keys
            .validate(&request.refresh_token, TokenKind::Refresh)
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))?;
        let account = self
            .tables
            .accounts
            .find_by_id(claims.account_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".to_string()))?;
        Self::ensure_active(&account)?;

        let roles = self.role_names(account.id).await?;
        self.issue(&account, &roles)
    }

    pub async fn change_password(&self, request: ChangePasswordRequest) -> Result<(), ServiceError> {
        let mut account = self.by_login(&request.account).await?.ok_or_else(bad_credentials)?;
        let old = password::decode(&request.password).ok_or_else(bad_credentials)?;
        if !password::verify(&old, &account.password_hash) {
            warn!("Wrong password in password change for {}", account.account);
            return Err(bad_credentials());
        }

        let new = password::decode(&request.new_password)
            .ok_or_else(|| ServiceError::validation("newPassword", "must be base64 encoded"))?;
        let repeated = password::decode(&request.re_new_password)
            .ok_or_else(|| ServiceError::validation("reNewPassword", "must be base64 encoded"))?;
        if new != repeated {
            return Err(ServiceError::validation("reNewPassword", "does not match newPassword"));
        }
        password::check_complexity(&new).map_err(|msg| ServiceError::validation("newPassword", msg))?;
        if new == old {
            return Err(ServiceError::validation("newPassword", "must differ from the current password"));
        }

        account.password_hash = self.hash(&new)?;
        account.is_change_password = false;
        account.updated_at = now();
        self.tables.accounts.update(account).await?;
        info!("Password changed for account {}", request.account.trim());
        Ok(())
    }

    pub async fn reset_password(&self, id: Uuid) -> Result<PasswordReset, ServiceError> {
        let mut account = self.fetch(id).await?;
        let initial_password = password::generate();
        account.password_hash = self.hash(&initial_password)?;
        account.is_change_password = true;
        account.updated_at = now();
        self.tables.accounts.update(account).await?;
        info!("Password reset for account {}", id);
        Ok(PasswordReset { account_id: id, initial_password })
    }
}
