use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::app::{app, AppState};
use crate::auth::JwtKeys;
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, Tables};
use crate::services::account::AccountInput;
use crate::services::organization::OrganizationInput;
use crate::services::position::PositionInput;
use crate::services::role::{AccountIds, RoleInput};

#[derive(Parser)]
#[command(name = "upms")]
#[command(about = "User and permission management backend", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Seed a root organization and an administrator account
    Bootstrap {
        #[arg(long, default_value = "Headquarters")]
        organization: String,
        #[arg(long, default_value = "admin")]
        account: String,
        #[arg(long, default_value = "admin@example.com")]
        email: String,
        #[arg(long, default_value = "10000000000")]
        mobile: String,
        #[arg(long, default_value = "A0001")]
        work_number: String,
    },
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            println!("Migrations applied");
            Ok(())
        }
        Command::Bootstrap { organization, account, email, mobile, work_number } => {
            let state = build_state(config).await?;
            let org = state
                .organizations
                .create(OrganizationInput { name: organization, description: "Root organization".to_string(), parent_id: None })
                .await?;
            let position = state
                .positions
                .create(PositionInput { name: "Administrator".to_string(), organization_id: org.id })
                .await?;
            let role = state.roles.create(RoleInput { name: "admin".to_string() }).await?;
            let created = state
                .accounts
                .create(AccountInput {
                    user_name: account.clone(),
                    account,
                    mobile,
                    email,
                    work_number,
                    hire_date: Utc::now().date_naive(),
                    position_id: position.id,
                    organization_id: org.id,
                    is_disabled: None,
                    is_leave: None,
                })
                .await?;
            state
                .roles
                .bind_accounts(role.id, AccountIds { account_ids: vec![created.account.id] })
                .await?;

            println!("Created account '{}' ({})", created.account.account, created.account.id);
            println!("Initial password: {}", created.initial_password);
            println!("The password must be changed before the first login.");
            Ok(())
        }
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<Option<PgPool>> {
    match config.database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Ok(None)
        }
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            Ok(Some(pool))
        }
    }
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let pool = connect(config).await?;
    let tables = match &pool {
        Some(pool) => Tables::postgres(pool.clone()),
        None => Tables::memory(),
    };
    let keys = JwtKeys::from_config(&config.security)?;
    Ok(AppState::new(tables, keys, config.security.bcrypt_cost, pool))
}

async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    let router = app(state, config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("UPMS API listening on http://{}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
