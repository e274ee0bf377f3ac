//! Process-local tenant directory for tests and single-node demos.

use crate::{DbError, Result as DbErrorResult, TenantDirectory};

use nh_core::Tenant;

use std::panic::Location;

use async_trait::async_trait;
use error_location::ErrorLocation;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryTenantDirectory {
    tenants: RwLock<Vec<Tenant>>,
    max_tenants_per_owner: u32,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how many tenants one owner may create (0 = unlimited)
    pub fn with_owner_limit(max_tenants_per_owner: u32) -> Self {
        Self {
            tenants: RwLock::new(Vec::new()),
            max_tenants_per_owner,
        }
    }

    /// Build a directory pre-populated with the given tenant names.
    pub fn with_tenants<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tenants = names
            .into_iter()
            .map(|name| Tenant::new(name.into(), None))
            .collect();

        Self {
            tenants: RwLock::new(tenants),
            max_tenants_per_owner: 0,
        }
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn lookup(&self, name: &str) -> DbErrorResult<Option<Tenant>> {
        let tenants = self.tenants.read().await;
        Ok(tenants.iter().find(|t| t.name == name).cloned())
    }

    async fn create(&self, name: &str, owner_id: Option<&str>) -> DbErrorResult<Tenant> {
        let mut tenants = self.tenants.write().await;

        if tenants.iter().any(|t| t.name == name) {
            return Err(DbError::Conflict {
                name: name.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if let Some(owner) = owner_id
            && self.max_tenants_per_owner > 0
        {
            let owned = tenants
                .iter()
                .filter(|t| t.owner_id.as_deref() == Some(owner))
                .count();
            if owned >= self.max_tenants_per_owner as usize {
                return Err(DbError::QuotaExceeded {
                    owner_id: owner.to_string(),
                    limit: self.max_tenants_per_owner,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        let tenant = Tenant::new(name.to_string(), owner_id.map(String::from));
        tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn list_names(&self) -> DbErrorResult<Vec<String>> {
        let tenants = self.tenants.read().await;
        Ok(tenants.iter().map(|t| t.name.clone()).collect())
    }
}
