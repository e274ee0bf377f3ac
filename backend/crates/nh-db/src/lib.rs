pub mod directory;
pub mod error;
pub mod repositories;

pub use directory::in_memory_tenant_directory::InMemoryTenantDirectory;
pub use directory::tenant_directory::TenantDirectory;
pub use error::{DbError, Result};
pub use repositories::tenant_repository::TenantRepository;

use sqlx::migrate::Migrator;

/// Schema migrations for the tenant directory
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
