pub mod in_memory_tenant_directory;
pub mod tenant_directory;
