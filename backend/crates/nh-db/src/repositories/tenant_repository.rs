//! SQLite-backed tenant directory.

use crate::{DbError, Result as DbErrorResult, TenantDirectory};

use nh_core::Tenant;

use std::panic::Location;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use log::{debug, info};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub struct TenantRepository {
    pool: SqlitePool,
    max_tenants_per_owner: u32,
}

impl TenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_tenants_per_owner: 0,
        }
    }

    /// Limit how many tenants one owner may create (0 = unlimited)
    pub fn with_owner_limit(mut self, max_tenants_per_owner: u32) -> Self {
        self.max_tenants_per_owner = max_tenants_per_owner;
        self
    }

    fn tenant_from_row(row: &SqliteRow) -> DbErrorResult<Tenant> {
        let id: String = row.try_get("id")?;
        let created_at: i64 = row.try_get("created_at")?;

        Ok(Tenant {
            id: Uuid::parse_str(&id).map_err(|e| DbError::InvalidRow {
                message: format!("Invalid UUID in nh_tenants.id: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?,
            name: row.try_get("name")?,
            secret_key: row.try_get("secret_key")?,
            owner_id: row.try_get("owner_id")?,
            created_at: DateTime::<Utc>::from_timestamp(created_at, 0).ok_or_else(|| {
                DbError::InvalidRow {
                    message: "Invalid timestamp in nh_tenants.created_at".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?,
            daily_notification_count: row.try_get("daily_notification_count")?,
        })
    }
}

#[async_trait]
impl TenantDirectory for TenantRepository {
    async fn lookup(&self, name: &str) -> DbErrorResult<Option<Tenant>> {
        let row = sqlx::query(
            r#"
                SELECT id, name, secret_key, owner_id, created_at, daily_notification_count
                FROM nh_tenants
                WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::tenant_from_row).transpose()
    }

    async fn create(&self, name: &str, owner_id: Option<&str>) -> DbErrorResult<Tenant> {
        let mut tx = self.pool.begin().await?;

        if let Some(owner) = owner_id
            && self.max_tenants_per_owner > 0
        {
            let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nh_tenants WHERE owner_id = ?")
                .bind(owner)
                .fetch_one(&mut *tx)
                .await?;

            if owned >= i64::from(self.max_tenants_per_owner) {
                return Err(DbError::QuotaExceeded {
                    owner_id: owner.to_string(),
                    limit: self.max_tenants_per_owner,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        let tenant = Tenant::new(name.to_string(), owner_id.map(String::from));

        let inserted = sqlx::query(
            r#"
                INSERT INTO nh_tenants (
                    id, name, secret_key, owner_id, created_at, daily_notification_count
                ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant.id.to_string())
        .bind(&tenant.name)
        .bind(&tenant.secret_key)
        .bind(&tenant.owner_id)
        .bind(tenant.created_at.timestamp())
        .bind(tenant.daily_notification_count)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                debug!("Tenant name already taken: {}", name);
                return Err(DbError::Conflict {
                    name: name.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        info!("Created tenant {} ({})", tenant.name, tenant.id);
        Ok(tenant)
    }

    async fn list_names(&self) -> DbErrorResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM nh_tenants ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }
}
