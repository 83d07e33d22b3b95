//! Product catalog repository trait (port)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Product, ProductVariant};
use crate::error::DomainError;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Matches name or SKU, case-insensitive.
    pub search: Option<String>,
    pub category: Option<String>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Product>, DomainError>;
    async fn create(&self, product: &Product) -> Result<Product, DomainError>;
    async fn update(&self, product: &Product) -> Result<Product, DomainError>;
    /// Soft-deletes the product and all of its variants in one transaction.
    async fn soft_delete(&self, tenant_id: &Uuid, id: &Uuid) -> Result<(), DomainError>;

    async fn list_variants(&self, tenant_id: &Uuid, product_id: &Uuid) -> Result<Vec<ProductVariant>, DomainError>;
    async fn find_variant(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<ProductVariant>, DomainError>;
    async fn create_variant(&self, variant: &ProductVariant) -> Result<ProductVariant, DomainError>;
    async fn update_variant(&self, variant: &ProductVariant) -> Result<ProductVariant, DomainError>;
}
