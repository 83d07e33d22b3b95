// ============================================================================
// BizDesk Core - Product Service
// File: crates/bizdesk-core/src/services/product_service.rs
// ============================================================================
//! Catalog CRUD, image uploads and applying approved enrichment values.

use std::sync::Arc;

use bizdesk_shared::constants::MAX_IMAGE_BYTES;
use bizdesk_shared::{Page, Pagination};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::context::TenantContext;
use crate::domain::{Product, ProductVariant};
use crate::error::DomainError;
use crate::gateways::ImageHost;
use crate::repositories::{ProductFilter, ProductRepository};

/// Fields for create and update. On update, `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
    pub price: Option<i64>,
    pub cost: Option<i64>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub attributes: Option<serde_json::Value>,
    pub price_override: Option<i64>,
    pub stock: Option<i32>,
}

/// Values a reviewer accepted from an enrichment result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovedEnrichment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageHost>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>, images: Arc<dyn ImageHost>) -> Self {
        Self { products, images }
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, DomainError> {
        self.products.list(&ctx.tenant_id, filter, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: &Uuid) -> Result<Product, DomainError> {
        self.products
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))
    }

    pub async fn create(&self, ctx: &TenantContext, input: ProductInput) -> Result<Product, DomainError> {
        let name = input
            .name
            .clone()
            .ok_or_else(|| DomainError::Validation("name is required".to_string()))?;
        let mut product = Product::new(ctx.tenant_id, name);
        apply_input(&mut product, input);
        product.validate()?;

        let created = self.products.create(&product).await?;
        info!(tenant_id = %ctx.tenant_id, product_id = %created.id, "Product created");
        Ok(created)
    }

    pub async fn update(&self, ctx: &TenantContext, id: &Uuid, input: ProductInput) -> Result<Product, DomainError> {
        let mut product = self.get(ctx, id).await?;
        if let Some(name) = input.name.as_deref() {
            product.name = name.trim().to_string();
        }
        apply_input(&mut product, input);
        product.validate()?;
        product.touch();
        self.products.update(&product).await
    }

    /// Soft-deletes the product together with its variants.
    pub async fn delete(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        self.get(ctx, id).await?;
        self.products.soft_delete(&ctx.tenant_id, id).await?;
        info!(tenant_id = %ctx.tenant_id, product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn upload_image(
        &self,
        ctx: &TenantContext,
        id: &Uuid,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Product, DomainError> {
        if !content_type.starts_with("image/") {
            return Err(DomainError::Validation(format!(
                "expected an image, got '{}'",
                content_type
            )));
        }
        if bytes.is_empty() {
            return Err(DomainError::Validation("file is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DomainError::Validation(format!(
                "image exceeds {} bytes",
                MAX_IMAGE_BYTES
            )));
        }

        let mut product = self.get(ctx, id).await?;
        let url = self.images.upload(file_name, bytes).await?;
        product.add_image(url);
        self.products.update(&product).await
    }

    pub async fn apply_enrichment(
        &self,
        ctx: &TenantContext,
        id: &Uuid,
        approved: ApprovedEnrichment,
    ) -> Result<Product, DomainError> {
        let mut product = self.get(ctx, id).await?;
        if let Some(name) = approved.name {
            product.name = name.trim().to_string();
        }
        if approved.description.is_some() {
            product.description = approved.description;
        }
        if approved.category.is_some() {
            product.category = approved.category;
        }
        if approved.brand.is_some() {
            product.brand = approved.brand;
        }
        if let Some(tags) = approved.tags {
            product.set_tags(tags);
        }
        for url in approved.image_urls {
            if url.starts_with("http://") || url.starts_with("https://") {
                product.add_image(url);
            } else {
                return Err(DomainError::Validation(format!("not an http(s) URL: {}", url)));
            }
        }
        product.validate()?;
        product.touch();

        let saved = self.products.update(&product).await?;
        info!(tenant_id = %ctx.tenant_id, product_id = %id, "Enrichment applied");
        Ok(saved)
    }

    // ------------------------------------------------------------- variants

    pub async fn list_variants(&self, ctx: &TenantContext, product_id: &Uuid) -> Result<Vec<ProductVariant>, DomainError> {
        self.get(ctx, product_id).await?;
        self.products.list_variants(&ctx.tenant_id, product_id).await
    }

    pub async fn create_variant(
        &self,
        ctx: &TenantContext,
        product_id: &Uuid,
        input: VariantInput,
    ) -> Result<ProductVariant, DomainError> {
        let product = self.get(ctx, product_id).await?;
        let name = input
            .name
            .clone()
            .ok_or_else(|| DomainError::Validation("name is required".to_string()))?;
        let mut variant = ProductVariant::new(&product, name);
        apply_variant_input(&mut variant, input)?;
        variant.validate()?;
        self.products.create_variant(&variant).await
    }

    pub async fn update_variant(
        &self,
        ctx: &TenantContext,
        variant_id: &Uuid,
        input: VariantInput,
    ) -> Result<ProductVariant, DomainError> {
        let mut variant = self.find_variant(ctx, variant_id).await?;
        if let Some(name) = input.name.as_deref() {
            variant.name = name.trim().to_string();
        }
        apply_variant_input(&mut variant, input)?;
        variant.validate()?;
        variant.updated_at = chrono::Utc::now();
        self.products.update_variant(&variant).await
    }

    pub async fn delete_variant(&self, ctx: &TenantContext, variant_id: &Uuid) -> Result<(), DomainError> {
        let mut variant = self.find_variant(ctx, variant_id).await?;
        variant.soft_delete();
        self.products.update_variant(&variant).await?;
        Ok(())
    }

    async fn find_variant(&self, ctx: &TenantContext, id: &Uuid) -> Result<ProductVariant, DomainError> {
        self.products
            .find_variant(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product variant"))
    }
}

fn apply_input(product: &mut Product, input: ProductInput) {
    if input.sku.is_some() {
        product.sku = input.sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    }
    if input.description.is_some() {
        product.description = input.description;
    }
    if input.category.is_some() {
        product.category = input.category;
    }
    if input.brand.is_some() {
        product.brand = input.brand;
    }
    if let Some(tags) = input.tags {
        product.set_tags(tags);
    }
    if let Some(price) = input.price {
        product.price = price;
    }
    if let Some(cost) = input.cost {
        product.cost = cost;
    }
    if let Some(stock) = input.stock {
        product.stock = stock;
    }
    if let Some(active) = input.is_active {
        product.is_active = active;
    }
}

fn apply_variant_input(variant: &mut ProductVariant, input: VariantInput) -> Result<(), DomainError> {
    if input.sku.is_some() {
        variant.sku = input.sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(attributes) = input.attributes {
        if !attributes.is_object() {
            return Err(DomainError::Validation("attributes must be a JSON object".to_string()));
        }
        variant.attributes = attributes;
    }
    if let Some(price) = input.price_override {
        if price < 0 {
            return Err(DomainError::Validation("price_override cannot be negative".to_string()));
        }
        variant.price_override = Some(price);
    }
    if let Some(stock) = input.stock {
        variant.stock = stock;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::MockImageHost;
    use crate::repositories::MockProductRepository;

    fn ctx(tenant: Uuid) -> TenantContext {
        TenantContext::staff(tenant, Uuid::new_v4(), "employee")
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let svc = ProductService::new(Arc::new(MockProductRepository::new()), Arc::new(MockImageHost::new()));
        let err = svc.create(&ctx(Uuid::new_v4()), ProductInput::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let svc = ProductService::new(Arc::new(MockProductRepository::new()), Arc::new(MockImageHost::new()));
        let input = ProductInput {
            name: Some("Pan".into()),
            price: Some(-1),
            ..Default::default()
        };
        assert!(svc.create(&ctx(Uuid::new_v4()), input).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_image_appends_url() {
        let tenant = Uuid::new_v4();
        let product = Product::new(tenant, "Queque".into());
        let id = product.id;

        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(move |_, _| Ok(Some(product.clone())));
        repo.expect_update()
            .withf(|p| p.image_urls == vec!["https://i.ibb.co/x/queque.png".to_string()])
            .returning(|p| Ok(p.clone()));
        let mut host = MockImageHost::new();
        host.expect_upload()
            .withf(|name, bytes| name == "queque.png" && bytes.len() == 3)
            .returning(|_, _| Ok("https://i.ibb.co/x/queque.png".to_string()));

        let svc = ProductService::new(Arc::new(repo), Arc::new(host));
        let saved = svc
            .upload_image(&ctx(tenant), &id, "queque.png", "image/png", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(saved.image_urls.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images_and_oversize() {
        let svc = ProductService::new(Arc::new(MockProductRepository::new()), Arc::new(MockImageHost::new()));
        let c = ctx(Uuid::new_v4());
        let id = Uuid::new_v4();
        assert!(svc.upload_image(&c, &id, "a.pdf", "application/pdf", vec![1]).await.is_err());
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(svc.upload_image(&c, &id, "a.png", "image/png", big).await.is_err());
    }

    #[tokio::test]
    async fn test_apply_enrichment() {
        let tenant = Uuid::new_v4();
        let product = Product::new(tenant, "pan".into());
        let id = product.id;

        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(move |_, _| Ok(Some(product.clone())));
        repo.expect_update().returning(|p| Ok(p.clone()));

        let svc = ProductService::new(Arc::new(repo), Arc::new(MockImageHost::new()));
        let saved = svc
            .apply_enrichment(
                &ctx(tenant),
                &id,
                ApprovedEnrichment {
                    name: Some("Pan amasado".into()),
                    tags: Some(vec!["Pan".into(), "pan".into()]),
                    image_urls: vec!["https://example.cl/pan.jpg".into()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.name, "Pan amasado");
        assert_eq!(saved.tags, vec!["pan"]);
        assert_eq!(saved.image_urls, vec!["https://example.cl/pan.jpg"]);
    }

    #[tokio::test]
    async fn test_variant_attributes_must_be_object() {
        let tenant = Uuid::new_v4();
        let product = Product::new(tenant, "Polera".into());
        let id = product.id;
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(move |_, _| Ok(Some(product.clone())));

        let svc = ProductService::new(Arc::new(repo), Arc::new(MockImageHost::new()));
        let err = svc
            .create_variant(
                &ctx(tenant),
                &id,
                VariantInput {
                    name: Some("XL".into()),
                    attributes: Some(serde_json::json!(["XL"])),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
