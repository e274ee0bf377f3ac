pub mod tenant_repository;
