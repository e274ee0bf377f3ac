use crate::Result as DbErrorResult;

use nh_core::Tenant;

use async_trait::async_trait;

/// Authoritative store of tenant identity and secret keys.
///
/// The gateway only reads through this seam, except for `create`, which is
/// the one path allowed to bring a tenant (and therefore a channel name)
/// into existence.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn lookup(&self, name: &str) -> DbErrorResult<Option<Tenant>>;

    /// Returns the tenant only when `secret` matches its key.
    async fn lookup_with_secret(&self, name: &str, secret: &str) -> DbErrorResult<Option<Tenant>> {
        Ok(self
            .lookup(name)
            .await?
            .filter(|tenant| tenant.secret_matches(secret)))
    }

    /// Fails with `DbError::Conflict` when the name is taken and
    /// `DbError::QuotaExceeded` when the owner is at the directory's limit.
    async fn create(&self, name: &str, owner_id: Option<&str>) -> DbErrorResult<Tenant>;

    /// Tenant names in creation order.
    async fn list_names(&self) -> DbErrorResult<Vec<String>>;
}
